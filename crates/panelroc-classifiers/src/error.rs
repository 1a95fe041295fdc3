/// Errors raised by the modeling, selection and ROC modules.
#[derive(thiserror::Error, Debug)]
pub enum PanelError {
    #[error("Found {0} NaN values in scores array")]
    NaNFound(usize),

    #[error("{what}: expected {expected} entries, got {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Dataset must contain at least one sample and one feature")]
    EmptyDataset,

    #[error("Training data contains only one class; both labels are required to fit {0}")]
    SingleClass(&'static str),

    #[error("Fitting {model} failed: {message}")]
    ModelFit {
        model: &'static str,
        message: String,
    },

    #[error("Model {0} was used before being fit")]
    NotFitted(&'static str),

    #[error("Panel size {panel_size} is invalid for {n_features} features")]
    InvalidPanelSize { panel_size: usize, n_features: usize },

    #[error("No candidate panel of size {panel_size} could be generated from the training data")]
    NoCandidatePanels { panel_size: usize },

    #[error("Each class needs at least {required} samples for nested leave-one-out, found {positives} positives and {negatives} negatives")]
    InsufficientClassMembers {
        required: usize,
        positives: usize,
        negatives: usize,
    },

    #[error("Feature names differ between training and validation tables (first difference at column {column}: '{train}' vs '{validation}')")]
    FeatureNameMismatch {
        column: usize,
        train: String,
        validation: String,
    },

    #[error("Unknown method id: {0}")]
    UnknownMethod(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Confidence band requires at least one surface")]
    EmptySurfaceList,

    #[error("Cannot build a hull from an empty confidence blob")]
    EmptyBlob,

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("Outer fold {fold} (panel size {panel_size}) failed: {source}")]
    FoldFailed {
        fold: usize,
        panel_size: usize,
        #[source]
        source: Box<PanelError>,
    },
}

pub type Result<T> = std::result::Result<T, PanelError>;
