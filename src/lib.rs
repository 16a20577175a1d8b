// imguru - image transform URL builder and signed edge proxy

pub mod adapters;
pub mod config;
pub mod edge;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod proxy;
pub mod service;
pub mod signing;
pub mod transform;
pub mod volumes;

pub use error::TransformError;
pub use service::ImageTransformService;
