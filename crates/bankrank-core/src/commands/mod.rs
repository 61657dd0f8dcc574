pub mod run;
pub mod sql;
