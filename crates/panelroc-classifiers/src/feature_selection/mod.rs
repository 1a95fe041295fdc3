//! Candidate panel generation.
//!
//! Panels come from two sources: the supports of L1-regularized linear
//! selectors swept along a regularization path ([`sparse_path`]) and the top
//! of tree-importance rankings ([`importance`]). [`panels`] merges both into
//! one deduplicated, deterministically ordered candidate list.
pub mod importance;
pub mod panels;
pub mod sparse_path;
