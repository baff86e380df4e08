// Genesis - Configuration et état initial
pub mod config;
pub mod spec;

pub use config::{ConfigError, LedgerConfig, NetworkParams, SubnetParams};
pub use spec::{dev_account, GenesisBuilder, GenesisSpec, GenesisSubnet};
