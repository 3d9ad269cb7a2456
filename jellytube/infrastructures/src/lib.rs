pub mod boundaries;
pub(crate) mod utils;

pub mod gateways {
    pub mod converters;
    pub mod downloaders;
    pub mod renderers;
    pub mod repositories;
}
