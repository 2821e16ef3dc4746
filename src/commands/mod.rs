pub type CmdResult<T> = chart_release::Result<T>;

pub mod release;
