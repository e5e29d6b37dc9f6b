//! Configuration module

mod site;

pub use site::ImageConfig;
pub use site::ImageProviderKind;
pub use site::SiteConfig;
