pub mod account;
pub mod arm;
pub mod az_rest;
pub mod cli;
pub mod credential;
pub(crate) mod dto;
pub mod routes;
