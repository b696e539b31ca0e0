pub mod derive;
pub mod feed;
pub mod policy;
pub mod raster;
pub mod transport;
