//! Publish transaction tests against fake collaborators.

use registry_tools_cli::archive::{ArchiveArtifact, Archiver};
use registry_tools_cli::cli::OutputManager;
use registry_tools_cli::config::{EnvConfig, TOKEN_ENV, TokenStore};
use registry_tools_cli::credentials::{AccessToken, CredentialResolver, Identity, TokenExchanger};
use registry_tools_cli::error::{ArchiveError, CredentialError, RtError, UpstreamError, ValidationError};
use registry_tools_cli::host::Hostname;
use registry_tools_cli::module::ModuleSpec;
use registry_tools_cli::prompt::{InputSource, ScriptedInput};
use registry_tools_cli::publish::{CliModuleArgs, Mode, PublishOutcome, PublishTransaction, Stage};
use registry_tools_cli::registry::{
    ApiError, PublishedVersion, RegistryClient, RegistryConnector,
};
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const ARCHIVE_SIZE: usize = 2048;

/// Ctrl-C arriving while the confirmation prompt waits
struct InterruptedInput<'a> {
    cancel: CancellationToken,
    archiver: &'a FakeArchiver,
    archive_present: bool,
}

impl InputSource for InterruptedInput<'_> {
    async fn read_line(&mut self, _prompt: &str) -> std::io::Result<String> {
        self.archive_present = self
            .archiver
            .packed
            .borrow()
            .iter()
            .all(|path| path.exists());
        self.cancel.cancel();
        std::future::pending().await
    }
}

struct NoExchange;

impl TokenExchanger for NoExchange {
    async fn exchange(
        &self,
        host: &Hostname,
        _client_id: &str,
        _client_secret: &AccessToken,
        _cancel: &CancellationToken,
    ) -> Result<AccessToken, CredentialError> {
        Err(CredentialError::Exchange {
            host: host.to_string(),
            reason: "not expected in tests".into(),
        })
    }
}

#[derive(Default)]
struct FakeArchiver {
    packed: RefCell<Vec<PathBuf>>,
    lose_file: bool,
}

impl Archiver for FakeArchiver {
    fn pack(&self, _directory: &Path) -> Result<ArchiveArtifact, ArchiveError> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[7u8; ARCHIVE_SIZE]).unwrap();
        let path = file.into_temp_path();
        self.packed.borrow_mut().push(path.to_path_buf());
        if self.lose_file {
            std::fs::remove_file(&path).unwrap();
        }
        Ok(ArchiveArtifact::new(path, ARCHIVE_SIZE as u64 * 4))
    }
}

enum Reply {
    Ok,
    NotFound,
    Rejected,
}

struct RegistryState {
    upload_reply: Reply,
    register_reply: Reply,
    uploads: RefCell<Vec<(String, u64)>>,
    registrations: Cell<usize>,
}

impl RegistryState {
    fn new(upload_reply: Reply, register_reply: Reply) -> Rc<Self> {
        Rc::new(Self {
            upload_reply,
            register_reply,
            uploads: RefCell::new(Vec::new()),
            registrations: Cell::new(0),
        })
    }
}

struct FakeClient {
    host: Hostname,
    state: Rc<RegistryState>,
}

fn reply_error(reply: &Reply) -> Option<ApiError> {
    match reply {
        Reply::Ok => None,
        Reply::NotFound => Some(ApiError::from_parts(
            404,
            r#"{"errors":[{"status":"404","title":"Not found"}]}"#,
        )),
        Reply::Rejected => Some(ApiError::from_parts(
            422,
            r#"{"errors":[{"status":"422","title":"Invalid version","detail":"1.0.0 already exists"}]}"#,
        )),
    }
}

impl RegistryClient for FakeClient {
    fn endpoint(&self) -> &Hostname {
        &self.host
    }

    async fn upload_archive(
        &self,
        filename: &str,
        size_hint: u64,
        _file: tokio::fs::File,
        _cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        self.state
            .uploads
            .borrow_mut()
            .push((filename.to_string(), size_hint));
        match reply_error(&self.state.upload_reply) {
            Some(e) => Err(e),
            None => Ok("blob-1".to_string()),
        }
    }

    async fn create_module_version(
        &self,
        spec: &ModuleSpec,
        archive_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<PublishedVersion, ApiError> {
        assert_eq!(archive_id, "blob-1");
        self.state
            .registrations
            .set(self.state.registrations.get() + 1);
        match reply_error(&self.state.register_reply) {
            Some(e) => Err(e),
            None => Ok(PublishedVersion {
                id: "mv-1".into(),
                namespace: spec.namespace.clone(),
                name: spec.name.clone(),
                system: spec.system.clone(),
                version: spec.version.clone(),
            }),
        }
    }
}

struct FakeConnector {
    state: Rc<RegistryState>,
}

impl RegistryConnector for FakeConnector {
    type Client = FakeClient;

    fn connect(&self, identity: &Identity) -> Result<FakeClient, CredentialError> {
        assert_eq!(identity.token.expose(), "ci-token");
        Ok(FakeClient {
            host: identity.host.clone(),
            state: Rc::clone(&self.state),
        })
    }
}

struct Fixture {
    dir: TempDir,
    env: EnvConfig,
    store: TokenStore,
    archiver: FakeArchiver,
    output: OutputManager,
    captured: registry_tools_cli::cli::CapturedOutput,
}

impl Fixture {
    fn new(env: EnvConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::load_from(dir.path().join("config.yaml")).unwrap();
        let (output, captured) = OutputManager::captured();
        Self {
            dir,
            env,
            store,
            archiver: FakeArchiver::default(),
            output,
            captured,
        }
    }

    fn with_token() -> Self {
        Self::new(EnvConfig::from_pairs([(TOKEN_ENV, "ci-token")]))
    }

    fn args(&self) -> CliModuleArgs {
        CliModuleArgs {
            namespace: Some("acme".into()),
            version: Some("1.0.0".into()),
            name: Some("net".into()),
            system: Some("aws".into()),
            directory: None,
            cwd: self.dir.path().to_path_buf(),
        }
    }

    fn transaction(
        &self,
        state: &Rc<RegistryState>,
        mode: Mode,
    ) -> PublishTransaction<'_, NoExchange, FakeConnector, &FakeArchiver> {
        self.transaction_with_cancel(state, mode, CancellationToken::new())
    }

    fn transaction_with_cancel(
        &self,
        state: &Rc<RegistryState>,
        mode: Mode,
        cancel: CancellationToken,
    ) -> PublishTransaction<'_, NoExchange, FakeConnector, &FakeArchiver> {
        PublishTransaction::new(
            CredentialResolver::new(&self.env, &self.store, NoExchange),
            FakeConnector {
                state: Rc::clone(state),
            },
            &self.archiver,
            &self.output,
            Hostname::parse("example.com").unwrap(),
            mode,
            self.dir.path(),
            cancel,
        )
    }

    fn archives_removed(&self) -> bool {
        self.archiver.packed.borrow().iter().all(|path| !path.exists())
    }
}

#[tokio::test]
async fn test_end_to_end_publish() {
    let fixture = Fixture::with_token();
    let state = RegistryState::new(Reply::Ok, Reply::Ok);
    let mut input = ScriptedInput::default();

    let outcome = fixture
        .transaction(&state, Mode::Automation)
        .run(&fixture.args(), &mut input)
        .await
        .unwrap();

    let PublishOutcome::Published(result) = outcome else {
        panic!("expected a published outcome");
    };
    assert_eq!(result.host.as_str(), "example.com");
    assert_eq!(result.size, ARCHIVE_SIZE as u64);
    assert_eq!(result.version.id, "mv-1");

    let usage = result.usage_example();
    assert!(usage.contains(r#"source = "example.com/acme/net/aws""#));
    assert!(usage.contains(r#"version = "1.0.0""#));

    assert_eq!(
        state.uploads.borrow().as_slice(),
        [("net-aws-1.0.0".to_string(), ARCHIVE_SIZE as u64)]
    );
    assert!(input.prompts().is_empty());
    assert!(fixture.archives_removed());
}

#[tokio::test]
async fn test_interactive_confirmation_shows_module() {
    let fixture = Fixture::with_token();
    let state = RegistryState::new(Reply::Ok, Reply::Ok);
    let mut input = ScriptedInput::new(["yes"]);

    let outcome = fixture
        .transaction(&state, Mode::Interactive)
        .run(&fixture.args(), &mut input)
        .await
        .unwrap();

    assert!(matches!(outcome, PublishOutcome::Published(_)));
    assert_eq!(
        input.prompts(),
        ["Publish to example.com? You must type 'yes' to confirm:"]
    );
    let shown = fixture.captured.contents();
    assert!(shown.contains("Namespace: acme"));
    assert!(shown.contains("Version:   1.0.0"));
    assert!(shown.contains("Directory: ."));
    assert!(shown.contains("Size:      8 kB (2 kB compressed)"));
}

#[tokio::test]
async fn test_declined_confirmation_aborts_before_upload() {
    let fixture = Fixture::with_token();
    let state = RegistryState::new(Reply::Ok, Reply::Ok);

    for answer in ["no", "YES", "y", ""] {
        let mut input = ScriptedInput::new([answer]);
        let outcome = fixture
            .transaction(&state, Mode::Interactive)
            .run(&fixture.args(), &mut input)
            .await
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Declined, "answer {answer:?}");
    }

    assert!(state.uploads.borrow().is_empty());
    assert_eq!(state.registrations.get(), 0);
    assert!(fixture.archives_removed());
}

#[tokio::test]
async fn test_upload_not_found_is_authentication_failure() {
    let fixture = Fixture::with_token();
    let state = RegistryState::new(Reply::NotFound, Reply::Ok);
    let mut input = ScriptedInput::default();

    let err = fixture
        .transaction(&state, Mode::Automation)
        .run(&fixture.args(), &mut input)
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Upload);
    assert!(matches!(
        err.error,
        RtError::Upstream(UpstreamError::Authentication)
    ));
    assert_eq!(
        err.to_string(),
        "authentication failed, check your credentials or re-run 'rt login'"
    );
    assert_eq!(err.exit_code(), 1);
    assert_eq!(state.registrations.get(), 0);
    assert!(fixture.archives_removed());
}

#[tokio::test]
async fn test_register_not_found_is_permission_failure() {
    let fixture = Fixture::with_token();
    let state = RegistryState::new(Reply::Ok, Reply::NotFound);
    let mut input = ScriptedInput::default();

    let err = fixture
        .transaction(&state, Mode::Automation)
        .run(&fixture.args(), &mut input)
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::RegisterVersion);
    assert_eq!(
        err.to_string(),
        "namespace does not exist or you do not have permission to publish to it"
    );
    assert!(fixture.archives_removed());
}

#[tokio::test]
async fn test_register_rejection_is_unclassified() {
    let fixture = Fixture::with_token();
    let state = RegistryState::new(Reply::Ok, Reply::Rejected);
    let mut input = ScriptedInput::default();

    let err = fixture
        .transaction(&state, Mode::Automation)
        .run(&fixture.args(), &mut input)
        .await
        .unwrap_err();

    assert!(matches!(
        err.error,
        RtError::Upstream(UpstreamError::Unclassified(_))
    ));
    assert_eq!(err.to_string(), "Invalid version: 1.0.0 already exists");
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_missing_namespace_fails_before_credentials() {
    // No credentials either: validation must win
    let fixture = Fixture::new(EnvConfig::default());
    let state = RegistryState::new(Reply::Ok, Reply::Ok);
    let mut input = ScriptedInput::default();
    let mut args = fixture.args();
    args.namespace = None;

    let err = fixture
        .transaction(&state, Mode::Interactive)
        .run(&args, &mut input)
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::ValidateArgs);
    assert!(matches!(
        err.error,
        RtError::Validation(ValidationError::MissingArgument { argument: "namespace" })
    ));
    assert_eq!(err.exit_code(), 1);
    assert!(fixture.archiver.packed.borrow().is_empty());
}

#[tokio::test]
async fn test_missing_credentials_exit_127() {
    let fixture = Fixture::new(EnvConfig::default());
    let state = RegistryState::new(Reply::Ok, Reply::Ok);
    let mut input = ScriptedInput::default();

    let err = fixture
        .transaction(&state, Mode::Interactive)
        .run(&fixture.args(), &mut input)
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::ResolveCredentials);
    assert!(matches!(
        err.error,
        RtError::Credential(CredentialError::LoginRequired)
    ));
    assert_eq!(err.exit_code(), 127);
    assert!(fixture.archiver.packed.borrow().is_empty());
    assert!(input.prompts().is_empty());
}

#[tokio::test]
async fn test_cancel_at_confirmation_removes_archive() {
    let fixture = Fixture::with_token();
    let state = RegistryState::new(Reply::Ok, Reply::Ok);
    let cancel = CancellationToken::new();
    let mut input = InterruptedInput {
        cancel: cancel.clone(),
        archiver: &fixture.archiver,
        archive_present: false,
    };

    let err = fixture
        .transaction_with_cancel(&state, Mode::Interactive, cancel)
        .run(&fixture.args(), &mut input)
        .await
        .unwrap_err();

    assert!(input.archive_present);
    assert_eq!(err.stage, Stage::Confirm);
    assert!(matches!(err.error, RtError::Cancelled));
    assert_eq!(err.exit_code(), 1);
    assert!(state.uploads.borrow().is_empty());
    assert_eq!(fixture.archiver.packed.borrow().len(), 1);
    assert!(fixture.archives_removed());
}

#[tokio::test]
async fn test_stat_failure_is_io_error() {
    let mut fixture = Fixture::with_token();
    fixture.archiver.lose_file = true;
    let state = RegistryState::new(Reply::Ok, Reply::Ok);
    let mut input = ScriptedInput::new(["yes"]);

    let err = fixture
        .transaction(&state, Mode::Interactive)
        .run(&fixture.args(), &mut input)
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Stat);
    assert!(matches!(
        err.error,
        RtError::Archive(ArchiveError::Io { operation: "stat", .. })
    ));
    assert_eq!(err.exit_code(), 2);
    assert!(input.prompts().is_empty());
    assert!(state.uploads.borrow().is_empty());
    assert!(fixture.archives_removed());
}
