use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("XML encoding error: {0}")]
    Xml(#[from] xmltree::Error),

    #[error("Service {0} registered twice")]
    DuplicateService(String),
}
