pub mod attachments;
pub mod db;
pub mod demo;
pub mod domain;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod repo;
pub mod validate;
