//! Interactive device login as an explicit state machine.

use super::device::{DeviceAuthorizationProvider, DeviceCode, DeviceEndpoints, PollResponse};
use crate::cli::OutputManager;
use crate::config::TokenStore;
use crate::credentials::AccessToken;
use crate::error::{LoginError, Result, RtError};
use crate::host::Hostname;
use crate::prompt::{InputSource, read_line_or_cancel};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Extra delay added to the poll interval on `slow_down`
pub const SLOW_DOWN_INCREMENT: Duration = Duration::from_secs(5);

const ACK_PROMPT: &str = "Press [Enter] to continue in the web browser...";

/// States of a device login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    /// Nothing requested yet
    Init,
    /// Asking the server for a device code
    RequestDeviceCode,
    /// Code shown, waiting for the user to acknowledge
    AwaitUserAck(DeviceCode),
    /// Polling the token endpoint
    PollForToken {
        /// Grant being polled
        code: DeviceCode,
        /// Current delay between polls
        interval: Duration,
        /// When the device code stops being valid
        deadline: Instant,
    },
    /// Token issued
    Success(AccessToken),
    /// Device code expired
    Expired,
    /// User rejected the request
    Denied,
    /// Transport or protocol failure
    Error(String),
}

impl LoginState {
    fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success(_) | Self::Expired | Self::Denied | Self::Error(_)
        )
    }
}

/// Drives a device login for one host
pub struct LoginFlow<'a, P, I> {
    provider: P,
    input: &'a mut I,
    output: &'a OutputManager,
    cancel: CancellationToken,
}

impl<'a, P, I> LoginFlow<'a, P, I>
where
    P: DeviceAuthorizationProvider,
    I: InputSource,
{
    /// Create a flow reading acknowledgments from `input`
    pub fn new(
        provider: P,
        input: &'a mut I,
        output: &'a OutputManager,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider,
            input,
            output,
            cancel,
        }
    }

    /// Log in to `host` and persist the token on success.
    ///
    /// The store is only written when a token was issued.
    pub async fn login(
        &mut self,
        host: &Hostname,
        store: &mut TokenStore,
        creator_version: &str,
    ) -> Result<()> {
        let token = self.authorize(host).await?;
        store.set_token(host.as_str(), token);
        store.save(creator_version).map_err(RtError::Config)?;
        log::debug!("Stored token for {host} in {}", store.path().display());
        Ok(())
    }

    /// Run the device flow and return the issued token
    pub async fn authorize(&mut self, host: &Hostname) -> std::result::Result<AccessToken, LoginError> {
        let endpoints = DeviceEndpoints::for_host(host);
        let mut state = LoginState::Init;

        while !state.is_terminal() {
            if self.cancel.is_cancelled() {
                return Err(LoginError::Cancelled);
            }
            state = self.step(state, &endpoints).await?;
        }

        match state {
            LoginState::Success(token) => Ok(token),
            LoginState::Expired => Err(LoginError::Expired),
            LoginState::Denied => Err(LoginError::Denied),
            LoginState::Error(reason) => Err(LoginError::Polling(reason)),
            _ => Err(LoginError::Polling("login ended in a non-terminal state".into())),
        }
    }

    async fn step(
        &mut self,
        state: LoginState,
        endpoints: &DeviceEndpoints,
    ) -> std::result::Result<LoginState, LoginError> {
        let next = match state {
            LoginState::Init => LoginState::RequestDeviceCode,

            LoginState::RequestDeviceCode => {
                let code = self
                    .provider
                    .request_device_code(endpoints, &self.cancel)
                    .await?;
                LoginState::AwaitUserAck(code)
            }

            LoginState::AwaitUserAck(code) => {
                self.output.print("First, copy your one-time code: ");
                self.output.highlight(&code.user_code);
                read_line_or_cancel(&mut *self.input, ACK_PROMPT, &self.cancel)
                    .await
                    .map_err(|e| LoginError::DeviceAuthorization(e.to_string()))?
                    .ok_or(LoginError::Cancelled)?;
                self.output
                    .info(&format!("Open {} to enter the code", code.verification_uri));
                self.output.println("Waiting for authorization...");

                let interval = code.interval;
                let deadline = Instant::now() + code.expires_in;
                LoginState::PollForToken {
                    code,
                    interval,
                    deadline,
                }
            }

            LoginState::PollForToken {
                code,
                interval,
                deadline,
            } => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(LoginState::Expired);
                }
                self.wait(interval.min(deadline - now)).await?;
                if Instant::now() >= deadline {
                    return Ok(LoginState::Expired);
                }

                match self
                    .provider
                    .poll_for_token(endpoints, &code, &self.cancel)
                    .await
                {
                    Ok(PollResponse::Pending) => LoginState::PollForToken {
                        code,
                        interval,
                        deadline,
                    },
                    Ok(PollResponse::SlowDown) => {
                        let interval = interval + SLOW_DOWN_INCREMENT;
                        log::debug!("Slowing down device polling to {interval:?}");
                        LoginState::PollForToken {
                            code,
                            interval,
                            deadline,
                        }
                    }
                    Ok(PollResponse::Granted(token)) => LoginState::Success(token),
                    Ok(PollResponse::Expired) => LoginState::Expired,
                    Ok(PollResponse::Denied) => LoginState::Denied,
                    Err(LoginError::Cancelled) => return Err(LoginError::Cancelled),
                    Err(e) => LoginState::Error(e.to_string()),
                }
            }

            terminal => terminal,
        };

        log::trace!("Login state: {}", state_name(&next));
        Ok(next)
    }

    async fn wait(&self, interval: Duration) -> std::result::Result<(), LoginError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(LoginError::Cancelled),
            _ = tokio::time::sleep(interval) => Ok(()),
        }
    }
}

fn state_name(state: &LoginState) -> &'static str {
    match state {
        LoginState::Init => "init",
        LoginState::RequestDeviceCode => "request-device-code",
        LoginState::AwaitUserAck(_) => "await-user-ack",
        LoginState::PollForToken { .. } => "poll-for-token",
        LoginState::Success(_) => "success",
        LoginState::Expired => "expired",
        LoginState::Denied => "denied",
        LoginState::Error(_) => "error",
    }
}
