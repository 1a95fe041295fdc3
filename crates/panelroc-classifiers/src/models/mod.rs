pub mod classifier_trait;
pub mod factory;
pub mod forest;
pub mod logistic;
pub mod naive_bayes;
pub mod svm;
pub mod tree;
pub mod utils;
