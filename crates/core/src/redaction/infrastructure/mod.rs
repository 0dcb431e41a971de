mod gaussian;
pub mod gaussian_blur_filter;
pub mod outline_redactor;
pub mod pixelate_filter;
pub mod redactor_factory;
