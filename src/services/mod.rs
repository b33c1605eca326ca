pub mod auth;
pub mod form_store;
pub mod generator;
pub mod geo;
pub mod nav;
pub mod notice;
pub mod presenter;
pub mod template;
pub mod view;
pub mod wizard;
