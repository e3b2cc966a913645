//! 带外注入

mod socket_injector;

pub use socket_injector::{
    InjectError, InjectOutcome, OutOfBandInjector, OutOfBandInjectorConfig,
};
