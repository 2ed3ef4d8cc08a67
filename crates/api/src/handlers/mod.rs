pub mod activity;
pub mod contact;
pub mod editor;
pub mod pages;
pub mod seo;
