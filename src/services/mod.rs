pub mod image_service;
pub mod shippo_service;
pub mod stripe_service;
pub mod translation_service;
