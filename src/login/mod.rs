//! Browser-based device login.
//!
//! `rt login` requests a device code, shows the one-time code, then polls
//! the token endpoint until the user approves or the code expires. Only a
//! successful login writes to the user config.

mod device;
mod flow;

pub use device::{
    CLIENT_ID, DeviceAuthorizationProvider, DeviceCode, DeviceEndpoints, HttpDeviceFlowProvider,
    PollResponse, SCOPE,
};
pub use flow::{LoginFlow, LoginState, SLOW_DOWN_INCREMENT};
