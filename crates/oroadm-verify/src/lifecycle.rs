//! Interface lifecycle verifier.
//!
//! Walks every reconstructed port through
//! `Idle → Created → ConfigChecked → Monitored → AlarmChecked → Deleted →
//! AbsenceVerified`, folding every defect into a [`ValidationVerdict`]
//! instead of stopping. Only an unreachable control API aborts a run.

use std::fmt;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, instrument, warn};

use oroadm_topology::{DegreePortRecord, NetworkPortRecord, PortRoleConfig};
use oroadm_types::{PortMappingEntry, SignalRate, XponderType};

use crate::compare::find_mismatch;
use crate::envelope::{as_list, field, str_field, unwrap_output};
use crate::error::{VerifierError, VerifierResult};
use crate::naming::{self, ClientKind, CyclePlan, Operation, PlanContext, PlannedResource, Spectrum};
use crate::session::{ControlApi, InterfaceLookup, ResourceId, RpcResponse, SessionFactory, ABSENT_STATUSES};
use crate::telemetry::TelemetryClient;
use crate::verdict::{Check, DefectCategory, ValidationVerdict};

/// Parameters of one lifecycle run.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleParams {
    pub node_id: String,
    /// Prefix of every renderer service name.
    pub service_name: String,
    pub spectrum: Spectrum,
    /// Rates to exercise; empty means "derive from each port's capabilities".
    pub rates: Vec<SignalRate>,
    /// Pause after every mutating call.
    pub settle_delay: Duration,
}

impl LifecycleParams {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            service_name: "oroadm-lifecycle".to_string(),
            spectrum: Spectrum::default(),
            rates: Vec::new(),
            settle_delay: Duration::ZERO,
        }
    }

    pub fn with_rates(mut self, rates: impl IntoIterator<Item = SignalRate>) -> Self {
        self.rates = rates.into_iter().collect();
        self
    }

    pub fn with_spectrum(mut self, spectrum: Spectrum) -> Self {
        self.spectrum = spectrum;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }
}

/// How a port is exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleClass {
    /// Fixed 1:1 client/network pairing.
    Transponder,
    /// 10G clients multiplexed onto the network port.
    Muxponder,
    /// 100G clients switched onto the network port.
    Switch,
    /// ROADM degree, exercised against every linked SRG port.
    RoadmDegree,
}

impl RoleClass {
    pub fn of_network(record: &NetworkPortRecord) -> Self {
        match record.xponder_type {
            Some(XponderType::Mpdr) => RoleClass::Muxponder,
            Some(XponderType::Switch) => RoleClass::Switch,
            Some(XponderType::Tpdr) | None => RoleClass::Transponder,
        }
    }

    /// What a port of this class must be linked to.
    pub fn linked_kind(&self) -> &'static str {
        match self {
            RoleClass::RoadmDegree => "shared-risk-group port",
            RoleClass::Transponder | RoleClass::Muxponder | RoleClass::Switch => "client port",
        }
    }

    fn client_kind(&self) -> Option<ClientKind> {
        match self {
            RoleClass::Muxponder => Some(ClientKind::Ethernet10G),
            RoleClass::Switch => Some(ClientKind::Ethernet100G),
            RoleClass::Transponder | RoleClass::RoadmDegree => None,
        }
    }
}

/// States of one create/delete cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Created,
    ConfigChecked,
    Monitored,
    AlarmChecked,
    Deleted,
    AbsenceVerified,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Drives renderer create/delete cycles and checks their effect on a node.
pub struct LifecycleVerifier<'a> {
    control: &'a dyn ControlApi,
    telemetry: TelemetryClient<'a>,
    params: LifecycleParams,
}

impl<'a> LifecycleVerifier<'a> {
    pub fn new(
        control: &'a dyn ControlApi,
        sessions: &'a dyn SessionFactory,
        params: LifecycleParams,
    ) -> Self {
        Self {
            control,
            telemetry: TelemetryClient::new(sessions, params.node_id.clone()),
            params,
        }
    }

    pub fn params(&self) -> &LifecycleParams {
        &self.params
    }

    fn context(&self) -> PlanContext {
        PlanContext {
            node_id: self.params.node_id.clone(),
            service_name: self.params.service_name.clone(),
            spectrum: self.params.spectrum,
        }
    }

    /// Exercises every network and degree port of a reconstructed topology.
    pub async fn verify(&self, config: &PortRoleConfig) -> VerifierResult<ValidationVerdict> {
        let mut verdict = ValidationVerdict::new();
        info!(
            "Starting lifecycle run on {} ({} ports)",
            self.params.node_id,
            config.len()
        );

        for record in config.network_ports() {
            self.verify_network_port(record, &mut verdict).await?;
        }
        for record in config.degree_ports() {
            self.verify_degree_port(record, &mut verdict).await?;
        }

        info!("Lifecycle run on {} finished: {}", self.params.node_id, verdict);
        Ok(verdict)
    }

    /// Exercises one xponder network port at every applicable rate.
    pub async fn verify_network_port(
        &self,
        record: &NetworkPortRecord,
        verdict: &mut ValidationVerdict,
    ) -> VerifierResult<()> {
        let ctx = self.context();
        let class = RoleClass::of_network(record);
        let network = &record.port;
        let Some(first_client) = record.linked_clients.first() else {
            unlinked(class, network, verdict);
            return Ok(());
        };

        for rate in self.rates_for(network) {
            match class.client_kind() {
                None => {
                    let plan = naming::optical_xponder(&ctx, network, Some(first_client), rate);
                    self.run_cycle(&plan, verdict).await?;
                }
                Some(kind) => {
                    let plan = naming::optical_xponder(&ctx, network, None, rate);
                    self.bring_up(&plan, verdict).await?;
                    for (index, client) in record.linked_clients.iter().enumerate() {
                        match naming::otn_client(&ctx, network, rate, client, kind, index) {
                            Some(client_plan) => self.run_cycle(&client_plan, verdict).await?,
                            None => verdict.downgrade(
                                Check::Create,
                                DefectCategory::Reconstruction,
                                client.lcp(),
                                format!(
                                    "{} at {} carries {} {}G clients, no tributary slots left",
                                    network.lcp(),
                                    rate,
                                    kind.capacity(rate),
                                    kind.service_rate()
                                ),
                            ),
                        }
                    }
                    self.tear_down(&plan, verdict).await?;
                }
            }
        }
        Ok(())
    }

    /// Exercises one ROADM degree against every linked SRG, in both directions.
    pub async fn verify_degree_port(
        &self,
        record: &DegreePortRecord,
        verdict: &mut ValidationVerdict,
    ) -> VerifierResult<()> {
        let ctx = self.context();
        let degree = &record.port;
        if record.linked_srgs.is_empty() {
            unlinked(RoleClass::RoadmDegree, degree, verdict);
            return Ok(());
        }
        for srg in &record.linked_srgs {
            let add = naming::roadm_path(&ctx, srg, degree, false);
            self.run_cycle(&add, verdict).await?;
            let drop_path = naming::roadm_path(&ctx, degree, srg, true);
            self.run_cycle(&drop_path, verdict).await?;
        }
        Ok(())
    }

    fn rates_for(&self, port: &PortMappingEntry) -> Vec<SignalRate> {
        if !self.params.rates.is_empty() {
            return self.params.rates.clone();
        }
        let rates = SignalRate::from_capabilities(port);
        if rates.is_empty() {
            warn!("No rate advertised by {}, assuming 100G", port.lcp());
            return vec![SignalRate::R100G];
        }
        rates
    }

    /// A full cycle: bring-up followed by tear-down.
    pub async fn run_cycle(&self, plan: &CyclePlan, verdict: &mut ValidationVerdict) -> VerifierResult<()> {
        self.bring_up(plan, verdict).await?;
        self.tear_down(plan, verdict).await
    }

    #[instrument(skip_all, fields(cycle = %plan.label))]
    async fn bring_up(&self, plan: &CyclePlan, verdict: &mut ValidationVerdict) -> VerifierResult<()> {
        self.create(plan, verdict).await?;
        self.settle().await;
        transition(plan, LifecycleState::Idle, LifecycleState::Created);

        self.check_config(plan, verdict).await?;
        transition(plan, LifecycleState::Created, LifecycleState::ConfigChecked);

        self.check_pm(plan, verdict).await;
        transition(plan, LifecycleState::ConfigChecked, LifecycleState::Monitored);

        self.check_alarm(plan, verdict).await;
        transition(plan, LifecycleState::Monitored, LifecycleState::AlarmChecked);
        Ok(())
    }

    #[instrument(skip_all, fields(cycle = %plan.label))]
    async fn tear_down(&self, plan: &CyclePlan, verdict: &mut ValidationVerdict) -> VerifierResult<()> {
        self.delete(plan, verdict).await?;
        self.settle().await;
        transition(plan, LifecycleState::AlarmChecked, LifecycleState::Deleted);

        self.check_absence(plan, verdict).await?;
        transition(plan, LifecycleState::Deleted, LifecycleState::AbsenceVerified);
        Ok(())
    }

    async fn settle(&self) {
        if !self.params.settle_delay.is_zero() {
            tokio::time::sleep(self.params.settle_delay).await;
        }
    }

    /// Invokes an RPC; `Ok(None)` when the call failed without the control API
    /// being unreachable.
    async fn invoke(&self, plan: &CyclePlan, operation: Operation) -> VerifierResult<Option<RpcResponse>> {
        debug!("Invoking {} ({}) for {}", plan.rpc, operation.as_str(), plan.label);
        match self.control.invoke(plan.rpc, plan.input(operation)).await {
            Ok(response) => Ok(Some(response)),
            Err(e) if e.is_unavailable() => Err(VerifierError::control_unavailable(plan.rpc, e)),
            Err(e) => {
                warn!("{} ({}) failed: {}", plan.rpc, operation.as_str(), e);
                Ok(None)
            }
        }
    }

    async fn lookup(&self, resource: &PlannedResource) -> VerifierResult<Option<InterfaceLookup>> {
        let node = &self.params.node_id;
        let result = if resource.is_connection() {
            self.control.get_roadm_connection(node, &resource.name).await
        } else {
            self.control.get_interface(node, &resource.name).await
        };
        match result {
            Ok(lookup) => Ok(Some(lookup)),
            Err(e) if e.is_unavailable() => {
                Err(VerifierError::control_unavailable(format!("lookup of {}", resource.name), e))
            }
            Err(e) => {
                warn!("Lookup of {} on {} failed: {}", resource.name, node, e);
                Ok(None)
            }
        }
    }

    async fn create(&self, plan: &CyclePlan, verdict: &mut ValidationVerdict) -> VerifierResult<()> {
        let Some(response) = self.invoke(plan, Operation::Create).await? else {
            verdict.downgrade(
                Check::Create,
                DefectCategory::AssertionMismatch,
                &plan.label,
                "create call failed",
            );
            return Ok(());
        };

        if let Err(detail) = check_rpc_success(&response) {
            verdict.downgrade(Check::Create, DefectCategory::AssertionMismatch, &plan.label, detail);
            return Ok(());
        }

        let output = unwrap_output(&response.output);
        let entry = field(output, "node-interface").and_then(|entries| {
            as_list(entries)
                .iter()
                .find(|e| str_field(e, "node-id") == Some(plan.node_id()))
        });
        match entry {
            None => verdict.downgrade(
                Check::Create,
                DefectCategory::AssertionMismatch,
                &plan.label,
                format!("no node-interface entry for {}", plan.node_id()),
            ),
            Some(entry) => {
                if let Some(mismatch) = find_mismatch(&plan.expected_node_interface(), entry) {
                    verdict.downgrade(
                        Check::Create,
                        DefectCategory::AssertionMismatch,
                        &plan.label,
                        format!("created interfaces differ at {}", mismatch),
                    );
                }
            }
        }
        Ok(())
    }

    async fn check_config(&self, plan: &CyclePlan, verdict: &mut ValidationVerdict) -> VerifierResult<()> {
        for resource in &plan.resources {
            match self.lookup(resource).await? {
                Some(InterfaceLookup::Present(observed)) => {
                    if let Some(mismatch) = find_mismatch(&resource.expected, &observed) {
                        verdict.downgrade(
                            Check::Config,
                            DefectCategory::AssertionMismatch,
                            &resource.name,
                            mismatch.to_string(),
                        );
                    } else {
                        debug!("{} matches its expected configuration", resource.name);
                    }
                }
                Some(InterfaceLookup::Absent(status)) => {
                    let detail = format!("never appeared (status {})", status);
                    verdict.downgrade(
                        Check::Create,
                        DefectCategory::LifecycleInconsistency,
                        &resource.name,
                        detail.clone(),
                    );
                    verdict.downgrade(
                        Check::Config,
                        DefectCategory::LifecycleInconsistency,
                        &resource.name,
                        detail,
                    );
                }
                None => verdict.downgrade(
                    Check::Config,
                    DefectCategory::AssertionMismatch,
                    &resource.name,
                    "configuration could not be fetched",
                ),
            }
        }
        Ok(())
    }

    async fn check_pm(&self, plan: &CyclePlan, verdict: &mut ValidationVerdict) {
        let resource = ResourceId::interface(&plan.primary);
        match self.telemetry.current_pm(&resource).await {
            Some(sample) => debug!(
                "PM {} on {} = {}",
                sample.pm_type, plan.primary, sample.value
            ),
            None => verdict.downgrade(
                Check::Pm,
                DefectCategory::TelemetryUnavailable,
                &plan.primary,
                "no PM sample",
            ),
        }
    }

    async fn check_alarm(&self, plan: &CyclePlan, verdict: &mut ValidationVerdict) {
        let resource = ResourceId::interface(&plan.primary);
        if !self.telemetry.has_alarm(&resource).await {
            verdict.downgrade(
                Check::Alarm,
                DefectCategory::TelemetryUnavailable,
                &plan.primary,
                "no active alarm raised",
            );
        }
    }

    async fn delete(&self, plan: &CyclePlan, verdict: &mut ValidationVerdict) -> VerifierResult<()> {
        let outcome = match self.invoke(plan, Operation::Delete).await? {
            Some(response) => check_rpc_success(&response),
            None => Err("delete call failed".to_string()),
        };
        if let Err(detail) = outcome {
            verdict.downgrade(Check::Delete, DefectCategory::AssertionMismatch, &plan.label, detail);
        }
        Ok(())
    }

    async fn check_absence(&self, plan: &CyclePlan, verdict: &mut ValidationVerdict) -> VerifierResult<()> {
        for resource in &plan.resources {
            let detail = match self.lookup(resource).await? {
                Some(InterfaceLookup::Absent(status)) if ABSENT_STATUSES.contains(&status) => continue,
                Some(InterfaceLookup::Absent(status)) => format!("unexpected status {} after delete", status),
                Some(InterfaceLookup::Present(_)) => "still present after delete".to_string(),
                None => "absence could not be confirmed".to_string(),
            };
            verdict.downgrade(
                Check::Delete,
                DefectCategory::LifecycleInconsistency,
                &resource.name,
                detail,
            );
        }
        Ok(())
    }
}

/// Records a port that cannot be exercised because nothing is linked to it.
fn unlinked(class: RoleClass, port: &PortMappingEntry, verdict: &mut ValidationVerdict) {
    verdict.downgrade(
        Check::Create,
        DefectCategory::Reconstruction,
        port.lcp(),
        format!("no linked {}, port not exercised", class.linked_kind()),
    );
}

fn transition(plan: &CyclePlan, from: LifecycleState, to: LifecycleState) {
    debug!("{}: {} -> {}", plan.label, from, to);
}

/// Checks status and the `success` flag of a renderer response.
fn check_rpc_success(response: &RpcResponse) -> Result<(), String> {
    if !response.is_success() {
        return Err(format!("status {}", response.status));
    }
    let output = unwrap_output(&response.output);
    match find_mismatch(&json!({"success": true}), output) {
        None => Ok(()),
        Some(_) => {
            let result = str_field(output, "result").unwrap_or("no result");
            Err(format!("renderer reported failure: {}", result))
        }
    }
}
