pub mod combined_redactor;
pub mod feathered_blurrer;
pub mod feathered_pixelator;
pub mod feathering;
pub mod gaussian;
pub mod rectangular_blurrer;
pub mod redactor_factory;
