use crate::{config, discovery, kuma, session};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error("failed to set up source discovery: {0}")]
    Discovery(#[from] discovery::Error),
    #[error("failed to set up Uptime Kuma client: {0}")]
    Client(#[from] kuma::ApiError),
    #[error(transparent)]
    Session(#[from] session::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ResultOkLogExt<T, E> {
    fn ok_log(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{err}");
                None
            }
        }
    }
}
