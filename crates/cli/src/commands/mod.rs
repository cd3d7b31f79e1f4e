pub mod profiles;
pub mod run;
