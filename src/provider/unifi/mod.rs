mod policy;
mod restful_cli;

mod unifi;
pub use unifi::Auth;
pub use unifi::Unifi;
pub use unifi::UnifiCfg;

#[cfg(test)]
mod unit_test;
