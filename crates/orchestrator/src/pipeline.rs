use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn, Instrument};
use warp_intents_assembler::{AssemblySource, TransactionAssembler};
use warp_intents_compiler::WarpCompiler;
use warp_intents_metrics::{PipelineMetrics, RequestSpan};
use warp_intents_resolver::IntentResolver;
use warp_intents_types::{
    DirectCall, Resolution, Styling, TransactionSigner, UnsignedTransaction, Warp,
};

use crate::error::{ErrorReport, PipelineError};
use crate::links::LinkBuilder;
use crate::registrar::AliasRegistrar;
use crate::submission::SubmissionOrchestrator;

/// Most prompts accepted by one batch request
pub const MAX_BATCH_SIZE: usize = 5;

/// How a compiled warp reaches the chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// Publish the warp document itself; the link resolves to it
    #[default]
    Inscribe,
    /// Send the assembled action transaction
    Execute,
}

/// Configuration for the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub publish_mode: PublishMode,
    pub max_batch_size: usize,
    /// Replaces every estimated or template gas limit when set
    pub gas_override: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            publish_mode: PublishMode::Inscribe,
            max_batch_size: MAX_BATCH_SIZE,
            gas_override: None,
        }
    }
}

/// Transaction fields shown before anything is signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub sender: String,
    pub receiver: String,
    pub value: String,
    pub gas_limit: u64,
    pub data: String,
}

impl From<&UnsignedTransaction> for TransactionSummary {
    fn from(tx: &UnsignedTransaction) -> Self {
        Self {
            sender: tx.sender.clone(),
            receiver: tx.receiver.clone(),
            value: tx.value.clone(),
            gas_limit: tx.gas_limit,
            data: tx.payload_str(),
        }
    }
}

/// Result of [`WarpPipeline::preview`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub resolution: Resolution,
    pub warp: Warp,
    pub transaction: TransactionSummary,
}

/// Result of a successful publication
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarpOutcome {
    pub intent_id: String,
    pub publish_mode: PublishMode,
    pub transaction_hash: String,
    pub nonce: u64,
    pub attempts: u32,
    pub warp_link: String,
    pub explorer_link: String,
    pub qr_code_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_error: Option<ErrorReport>,
    pub warp: Warp,
}

impl WarpOutcome {
    /// The warp was published but the requested alias was not
    pub fn is_partial(&self) -> bool {
        self.alias_error.is_some()
    }
}

/// One entry of a batch; exactly one of `outcome` and `error` is set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<WarpOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl BatchItem {
    pub fn is_success(&self) -> bool {
        self.outcome.is_some()
    }
}

/// What the network knows about a published warp
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarpDetails {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub transaction_hash: String,
    pub status: String,
    pub sender: String,
    pub receiver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub warp_link: String,
    pub explorer_link: String,
    /// Decoded document, when the transaction is an inscription
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warp: Option<Warp>,
}

/// Builder error
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("missing required field: {field}")]
    MissingField { field: String },
}

/// Builder for [`WarpPipeline`]
#[derive(Default)]
pub struct WarpPipelineBuilder {
    resolver: Option<Arc<IntentResolver>>,
    compiler: Option<Arc<WarpCompiler>>,
    assembler: Option<Arc<TransactionAssembler>>,
    orchestrator: Option<Arc<SubmissionOrchestrator>>,
    registrar: Option<Arc<AliasRegistrar>>,
    signer: Option<Arc<dyn TransactionSigner>>,
    links: LinkBuilder,
    metrics: Option<Arc<PipelineMetrics>>,
    config: PipelineConfig,
}

impl WarpPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: Arc<IntentResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_compiler(mut self, compiler: Arc<WarpCompiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    /// Defaults to a devnet assembler with the linear gas estimator
    pub fn with_assembler(mut self, assembler: Arc<TransactionAssembler>) -> Self {
        self.assembler = Some(assembler);
        self
    }

    pub fn with_orchestrator(mut self, orchestrator: Arc<SubmissionOrchestrator>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    pub fn with_registrar(mut self, registrar: Arc<AliasRegistrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn TransactionSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_links(mut self, links: LinkBuilder) -> Self {
        self.links = links;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<WarpPipeline, BuilderError> {
        let resolver = self.resolver.ok_or_else(|| missing("resolver"))?;
        let compiler = self.compiler.ok_or_else(|| missing("compiler"))?;
        let orchestrator = self.orchestrator.ok_or_else(|| missing("orchestrator"))?;
        let registrar = self.registrar.ok_or_else(|| missing("registrar"))?;
        let signer = self.signer.ok_or_else(|| missing("signer"))?;

        Ok(WarpPipeline {
            resolver,
            compiler,
            assembler: self.assembler.unwrap_or_default(),
            orchestrator,
            registrar,
            signer,
            links: self.links,
            metrics: self.metrics,
            config: self.config,
        })
    }
}

fn missing(field: &str) -> BuilderError {
    BuilderError::MissingField {
        field: field.to_string(),
    }
}

/// Prompt in, published warp out
///
/// Every request runs its stages one after another. The collaborators are
/// shared and immutable, so one pipeline can serve concurrent requests.
pub struct WarpPipeline {
    resolver: Arc<IntentResolver>,
    compiler: Arc<WarpCompiler>,
    assembler: Arc<TransactionAssembler>,
    orchestrator: Arc<SubmissionOrchestrator>,
    registrar: Arc<AliasRegistrar>,
    signer: Arc<dyn TransactionSigner>,
    links: LinkBuilder,
    metrics: Option<Arc<PipelineMetrics>>,
    config: PipelineConfig,
}

impl WarpPipeline {
    pub fn builder() -> WarpPipelineBuilder {
        WarpPipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn compiler(&self) -> &WarpCompiler {
        &self.compiler
    }

    pub fn registrar(&self) -> &AliasRegistrar {
        &self.registrar
    }

    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    pub fn signer_address(&self) -> &str {
        self.signer.address()
    }

    /// Resolve, compile and assemble without touching the network
    pub fn preview(
        &self,
        prompt: &str,
        styling: Option<Styling>,
    ) -> Result<Preview, PipelineError> {
        self.pre_network(|| {
            let resolution = self.resolve(prompt)?;
            let warp = self.compile_resolution(&resolution, styling)?;
            let direct = match &resolution {
                Resolution::DirectCall(call) => Some(call),
                Resolution::Template { .. } => None,
            };
            let tx = self.build_transaction(&warp, direct)?;
            Ok(Preview {
                transaction: TransactionSummary::from(&tx),
                resolution,
                warp,
            })
        })
    }

    pub async fn create_from_prompt(
        &self,
        prompt: &str,
        alias: Option<&str>,
        styling: Option<Styling>,
    ) -> Result<WarpOutcome, PipelineError> {
        let request = RequestSpan::new("create_from_prompt");
        async {
            let (resolution, warp, tx, alias) = self.pre_network(|| {
                let alias = normalize_alias(alias)?;
                let resolution = self.resolve(prompt)?;
                let warp = self.compile_resolution(&resolution, styling)?;
                let direct = match &resolution {
                    Resolution::DirectCall(call) => Some(call),
                    Resolution::Template { .. } => None,
                };
                let tx = self.build_transaction(&warp, direct)?;
                Ok((resolution, warp, tx, alias))
            })?;
            self.publish(resolution.intent_id(), warp, tx, alias).await
        }
        .instrument(request.span())
        .await
    }

    pub async fn create_from_direct_call(
        &self,
        call: &DirectCall,
        alias: Option<&str>,
    ) -> Result<WarpOutcome, PipelineError> {
        let request = RequestSpan::new("create_from_direct_call");
        async {
            let (warp, tx, alias) = self.pre_network(|| {
                let alias = normalize_alias(alias)?;
                let warp = self.compiler.compile_direct(call, None)?;
                let tx = self.build_transaction(&warp, Some(call))?;
                Ok((warp, tx, alias))
            })?;
            self.publish("directCall", warp, tx, alias).await
        }
        .instrument(request.span())
        .await
    }

    /// Publish a caller supplied warp after normalizing it
    pub async fn create_from_warp(
        &self,
        warp: Warp,
        alias: Option<&str>,
    ) -> Result<WarpOutcome, PipelineError> {
        let request = RequestSpan::new("create_from_warp");
        async {
            let (warp, tx, alias) = self.pre_network(|| {
                let alias = normalize_alias(alias)?;
                let warp = self.compiler.normalize(warp)?;
                let tx = self.build_transaction(&warp, None)?;
                Ok((warp, tx, alias))
            })?;
            let intent_id = warp.name.clone();
            self.publish(&intent_id, warp, tx, alias).await
        }
        .instrument(request.span())
        .await
    }

    /// Publish several prompts one after another
    ///
    /// Each item fails or succeeds on its own; only an oversized batch fails
    /// as a whole.
    pub async fn create_batch(&self, prompts: &[String]) -> Result<Vec<BatchItem>, PipelineError> {
        if prompts.len() > self.config.max_batch_size {
            return Err(PipelineError::BatchTooLarge {
                max: self.config.max_batch_size,
                got: prompts.len(),
            });
        }

        let mut items = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let item = match self.create_from_prompt(prompt, None, None).await {
                Ok(outcome) => BatchItem {
                    prompt: prompt.clone(),
                    outcome: Some(outcome),
                    error: None,
                },
                Err(e) => {
                    warn!(prompt = %prompt, code = %e.code(), error = %e, "batch item failed");
                    BatchItem {
                        prompt: prompt.clone(),
                        outcome: None,
                        error: Some(ErrorReport::from(&e)),
                    }
                }
            };
            items.push(item);
        }

        info!(
            total = items.len(),
            succeeded = items.iter().filter(|i| i.is_success()).count(),
            "batch finished"
        );
        Ok(items)
    }

    /// Look up a warp by alias or by `hash:<hash>`
    pub async fn inspect(&self, identifier: &str) -> Result<WarpDetails, PipelineError> {
        let identifier = identifier.trim();
        let (alias, hash) = match parse_hash_identifier(identifier) {
            Some(hash) => (None, hash.to_string()),
            None => {
                let hash = self
                    .registrar
                    .resolve(identifier)
                    .await?
                    .ok_or_else(|| PipelineError::UnknownIdentifier(identifier.to_string()))?;
                (Some(identifier.to_string()), hash)
            }
        };

        let info = self
            .orchestrator
            .api()
            .get_transaction(&hash)
            .await
            .map_err(PipelineError::ChainQuery)?;

        let warp = info
            .data
            .as_deref()
            .and_then(|data| BASE64.decode(data).ok())
            .and_then(|bytes| serde_json::from_slice::<Warp>(&bytes).ok());

        Ok(WarpDetails {
            identifier: identifier.to_string(),
            alias,
            warp_link: self.links.hash_link(&hash),
            explorer_link: self.links.explorer_link(&hash),
            transaction_hash: hash,
            status: info.status,
            sender: info.sender,
            receiver: info.receiver,
            timestamp: info
                .timestamp
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
            warp,
        })
    }

    fn resolve(&self, prompt: &str) -> Result<Resolution, PipelineError> {
        let resolution = self.resolver.resolve(prompt)?;
        if let Some(metrics) = &self.metrics {
            metrics.record_intent_resolved(resolution.intent_id());
        }
        Ok(resolution)
    }

    fn compile_resolution(
        &self,
        resolution: &Resolution,
        styling: Option<Styling>,
    ) -> Result<Warp, PipelineError> {
        let warp = match resolution {
            Resolution::Template { intent_id, params } => {
                self.compiler.compile(intent_id, params, styling)?
            }
            Resolution::DirectCall(call) => self.compiler.compile_direct(call, styling)?,
        };
        Ok(warp)
    }

    fn build_transaction(
        &self,
        warp: &Warp,
        direct: Option<&DirectCall>,
    ) -> Result<UnsignedTransaction, PipelineError> {
        let sender = self.signer.address();
        let gas = self.config.gas_override;
        let tx = match (self.config.publish_mode, direct) {
            (PublishMode::Inscribe, _) => self.assembler.inscribe(warp, sender, gas)?,
            (PublishMode::Execute, Some(call)) => {
                self.assembler
                    .assemble(AssemblySource::Direct(call), sender, gas)?
            }
            (PublishMode::Execute, None) => {
                self.assembler
                    .assemble(AssemblySource::Warp(warp), sender, gas)?
            }
        };
        Ok(tx)
    }

    /// Run a step that must finish before any network call, counting failures
    fn pre_network<T>(
        &self,
        step: impl FnOnce() -> Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        step().map_err(|e| {
            warn!(code = %e.code(), error = %e, "request rejected before submission");
            if let Some(metrics) = &self.metrics {
                metrics.record_compile_failure(e.code().as_str());
            }
            e
        })
    }

    async fn publish(
        &self,
        intent_id: &str,
        warp: Warp,
        tx: UnsignedTransaction,
        alias: Option<String>,
    ) -> Result<WarpOutcome, PipelineError> {
        let report = self.orchestrator.submit(tx, self.signer.as_ref()).await?;
        let warp_link = self.links.hash_link(&report.hash);

        let mut outcome = WarpOutcome {
            intent_id: intent_id.to_string(),
            publish_mode: self.config.publish_mode,
            explorer_link: self.links.explorer_link(&report.hash),
            qr_code_url: self.links.qr_code_url(&warp_link),
            warp_link,
            transaction_hash: report.hash.clone(),
            nonce: report.nonce,
            attempts: report.attempt_count(),
            alias: None,
            alias_link: None,
            alias_transaction_hash: None,
            alias_error: None,
            warp,
        };

        if let Some(alias) = alias {
            match self
                .registrar
                .register_alias(&report.hash, &alias, self.signer.as_ref())
                .await
            {
                Ok(registration) => {
                    outcome.alias_link = Some(self.links.alias_link(&alias));
                    outcome.alias_transaction_hash = Some(registration.hash);
                }
                Err(e) => {
                    let e = PipelineError::from(e);
                    warn!(
                        alias = %alias,
                        tx_hash = %report.hash,
                        code = %e.code(),
                        error = %e,
                        "warp published without its alias"
                    );
                    outcome.alias_error = Some(ErrorReport::from(&e));
                }
            }
            outcome.alias = Some(alias);
        }

        info!(
            intent_id,
            tx_hash = %outcome.transaction_hash,
            partial = outcome.is_partial(),
            "warp published"
        );
        Ok(outcome)
    }
}

fn normalize_alias(alias: Option<&str>) -> Result<Option<String>, PipelineError> {
    alias
        .map(|a| AliasRegistrar::normalize(a).map(str::to_string))
        .transpose()
        .map_err(PipelineError::from)
}

/// `hash:<h>` or its percent-encoded form
fn parse_hash_identifier(identifier: &str) -> Option<&str> {
    identifier
        .strip_prefix("hash:")
        .or_else(|| identifier.strip_prefix("hash%3A"))
        .map(str::trim)
        .filter(|h| !h.is_empty())
}
