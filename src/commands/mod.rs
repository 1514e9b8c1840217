pub mod deploy;

pub type CmdResult<T> = stackdeploy::Result<T>;
