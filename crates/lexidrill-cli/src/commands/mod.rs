pub mod drill;
pub mod grammar;
pub mod init;
pub mod practice;
pub mod transfer;
pub mod words;
