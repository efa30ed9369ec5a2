//! One verification run: token check, probes in declared order, report.

use log::{info, warn};

use crate::asset::TestImage;
use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::outcome::{Outcome, ProbeResult};
use crate::probe::{self, ProbeDescriptor, ProbeName, ProbeRunner, Transport};
use crate::report::{self, Report};
use crate::token::{self, TokenAnalysis};

pub const SKIPPED_INVALID_TOKEN: &str = "skipped: access token failed heuristic check";

pub struct Harness<T: Transport> {
    config: Config,
    credentials: Credentials,
    runner: ProbeRunner<T>,
}

impl<T: Transport> Harness<T> {
    pub fn new(config: Config, credentials: Credentials, transport: T) -> Self {
        Self {
            config,
            credentials,
            runner: ProbeRunner::new(transport),
        }
    }

    pub fn runner(&self) -> &ProbeRunner<T> {
        &self.runner
    }

    /// Declared probe names, optionally narrowed to `only`
    pub fn selected(&self, only: &[ProbeName]) -> Vec<ProbeName> {
        ProbeName::ALL
            .iter()
            .copied()
            .filter(|name| only.is_empty() || only.contains(name))
            .collect()
    }

    /// The image is only produced for the multimodal probe
    pub fn descriptor(&self, name: ProbeName) -> Result<ProbeDescriptor> {
        probe::build(name, &self.config, || {
            TestImage::resolve(self.config.multimodal.image_path.as_deref())
        })
    }

    pub fn token_analysis(&self) -> TokenAnalysis {
        token::analyze(self.credentials.access_token())
    }

    /// Run the selected probes sequentially and build the report
    pub async fn run(&self, only: &[ProbeName]) -> Report {
        let token = self.token_analysis();
        let results = self.run_selected(&self.selected(only), &token).await;

        report::aggregate(&results)
            .with_credentials(&self.credentials)
            .with_token(token)
    }

    async fn run_selected(&self, names: &[ProbeName], token: &TokenAnalysis) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(names.len());
        for name in names {
            let descriptor = match self.descriptor(*name) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    warn!("Could not prepare {}: {}", name, e);
                    results.push(ProbeResult {
                        probe: *name,
                        outcome: Outcome::Failure,
                        detail: e.to_string(),
                    });
                    continue;
                }
            };

            if self.should_skip(&descriptor, token) {
                warn!("Skipping {}: {}", descriptor.name, SKIPPED_INVALID_TOKEN);
                results.push(ProbeResult {
                    probe: descriptor.name,
                    outcome: Outcome::Failure,
                    detail: SKIPPED_INVALID_TOKEN.to_string(),
                });
                continue;
            }
            results.push(self.runner.run(&descriptor, &self.credentials).await);
        }

        info!(
            "Completed {} probes ({} succeeded)",
            results.len(),
            results.iter().filter(|r| r.outcome.is_success()).count()
        );
        results
    }

    fn should_skip(&self, descriptor: &ProbeDescriptor, token: &TokenAnalysis) -> bool {
        descriptor.kind == probe::TargetKind::TokenGatedRest
            && self.config.vertex.skip_on_invalid_token
            && token.check.is_invalid()
    }
}
