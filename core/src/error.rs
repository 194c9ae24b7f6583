use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatModemError {
    #[error("Decoded payload too short to carry a frame")]
    PayloadTooShort,

    #[error("Declared sender length exceeds recovered payload")]
    SenderLengthOutOfRange,

    #[error("Sender name too long: {0} bytes")]
    SenderTooLong(usize),

    #[error("Audio device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, ChatModemError>;
