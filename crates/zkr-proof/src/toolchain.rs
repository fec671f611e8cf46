//! # Toolchain Prover — Server-Side Fallback
//!
//! A non-browser generation path that shells out to the snarkjs toolchain
//! against temporary files instead of an in-process capability. Only
//! circuits on a fixed allow-list have compiled artifacts available to it;
//! every other circuit — and any toolchain failure — yields a
//! [`PlaceholderProof`], the type-distinct non-cryptographic stand-in.
//!
//! ## Layout expectations
//!
//! For an allow-listed circuit `{id}`, the configured artifacts directory
//! must hold the snarkjs compilation output:
//!
//! ```text
//! {dir}/{id}.wasm                    compiled circuit
//! {dir}/{id}.zkey                    proving key
//! {dir}/{id}_vkey.json               verification key
//! {dir}/{id}_js/generate_witness.js  witness generator
//! ```

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Instant;
use tokio::process::Command;

use zkr_core::{field_element_bytes, CircuitId, ProofRequest, ProofResult};

use crate::engine::{GeneratedProof, PlaceholderProof, ProofGenerator};
use crate::error::ProofError;

/// Configuration for [`ToolchainProver`].
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Directory holding compiled circuit artifacts.
    pub circuits_dir: PathBuf,
    /// The `node` binary used for witness generation.
    pub node_bin: String,
    /// The `snarkjs` binary used for proving and verification.
    pub snarkjs_bin: String,
    /// Circuits with compiled artifacts available to the toolchain.
    pub allowed: Vec<CircuitId>,
}

impl ToolchainConfig {
    /// Standard configuration: only `age-verification` is compiled for
    /// the server-side path.
    pub fn new(circuits_dir: impl Into<PathBuf>) -> Self {
        Self {
            circuits_dir: circuits_dir.into(),
            node_bin: "node".to_string(),
            snarkjs_bin: "snarkjs".to_string(),
            allowed: vec![CircuitId::AgeVerification],
        }
    }
}

/// Shells out to the proving toolchain; placeholder for everything else.
pub struct ToolchainProver {
    config: ToolchainConfig,
}

#[derive(Debug, Deserialize)]
struct SnarkjsProof {
    pi_a: Vec<String>,
    pi_b: Vec<Vec<String>>,
    pi_c: Vec<String>,
}

impl ToolchainProver {
    /// Prover over the given toolchain configuration.
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    fn wasm_path(&self, circuit: CircuitId) -> PathBuf {
        self.config.circuits_dir.join(format!("{circuit}.wasm"))
    }

    fn zkey_path(&self, circuit: CircuitId) -> PathBuf {
        self.config.circuits_dir.join(format!("{circuit}.zkey"))
    }

    fn vkey_path(&self, circuit: CircuitId) -> PathBuf {
        self.config.circuits_dir.join(format!("{circuit}_vkey.json"))
    }

    fn witness_script(&self, circuit: CircuitId) -> PathBuf {
        self.config
            .circuits_dir
            .join(format!("{circuit}_js"))
            .join("generate_witness.js")
    }

    async fn run_toolchain(&self, request: &ProofRequest) -> Result<ProofResult, String> {
        let circuit = request.circuit;

        for path in [
            self.wasm_path(circuit),
            self.zkey_path(circuit),
            self.vkey_path(circuit),
            self.witness_script(circuit),
        ] {
            if !path.exists() {
                return Err(format!("missing compiled artifact: {}", path.display()));
            }
        }

        let workdir =
            tempfile::tempdir().map_err(|e| format!("failed to create temp dir: {e}"))?;
        let input_path = workdir.path().join("input.json");
        let witness_path = workdir.path().join("witness.wtns");
        let proof_path = workdir.path().join("proof.json");
        let public_path = workdir.path().join("public.json");

        let input_json = serde_json::to_vec(&request.inputs)
            .map_err(|e| format!("failed to serialize inputs: {e}"))?;
        tokio::fs::write(&input_path, input_json)
            .await
            .map_err(|e| format!("failed to write inputs: {e}"))?;

        let started = Instant::now();

        run_command(
            Command::new(&self.config.node_bin)
                .arg(self.witness_script(circuit))
                .arg(self.wasm_path(circuit))
                .arg(&input_path)
                .arg(&witness_path),
            "witness generation",
        )
        .await?;

        run_command(
            Command::new(&self.config.snarkjs_bin)
                .arg("groth16")
                .arg("prove")
                .arg(self.zkey_path(circuit))
                .arg(&witness_path)
                .arg(&proof_path)
                .arg(&public_path),
            "proof generation",
        )
        .await?;

        let proof_json = tokio::fs::read(&proof_path)
            .await
            .map_err(|e| format!("failed to read proof output: {e}"))?;
        let raw: SnarkjsProof = serde_json::from_slice(&proof_json)
            .map_err(|e| format!("malformed proof output: {e}"))?;
        let proof_data = parse_proof(&raw)?;

        let public_json = tokio::fs::read(&public_path)
            .await
            .map_err(|e| format!("failed to read public signals: {e}"))?;
        let public_signals: Vec<String> = serde_json::from_slice(&public_json)
            .map_err(|e| format!("malformed public signals: {e}"))?;

        // Exit status carries the verdict; a proof that fails to verify is
        // still returned, flagged invalid.
        let is_valid = Command::new(&self.config.snarkjs_bin)
            .arg("groth16")
            .arg("verify")
            .arg(self.vkey_path(circuit))
            .arg(&public_path)
            .arg(&proof_path)
            .output()
            .await
            .map_err(|e| format!("verification failed to start: {e}"))?
            .status
            .success();

        let verification_key = tokio::fs::read_to_string(self.vkey_path(circuit))
            .await
            .map_err(|e| format!("failed to read verification key: {e}"))?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(circuit = %circuit, is_valid, elapsed_ms, "toolchain proof generated");

        let proof_hash = proof_data.display_hash();
        Ok(ProofResult {
            circuit,
            proof_data,
            public_signals,
            is_valid,
            verification_key,
            proof_hash,
            generated_at: Utc::now(),
            elapsed_ms,
        })
    }
}

#[async_trait]
impl ProofGenerator for ToolchainProver {
    async fn generate(&self, request: &ProofRequest) -> Result<GeneratedProof, ProofError> {
        let circuit = request.circuit;
        if !self.config.allowed.contains(&circuit) {
            return Ok(GeneratedProof::Placeholder(PlaceholderProof {
                circuit,
                reason: "circuit not in toolchain allow-list".to_string(),
                generated_at: Utc::now(),
            }));
        }

        match self.run_toolchain(request).await {
            Ok(result) => Ok(GeneratedProof::Real(result)),
            Err(reason) => {
                tracing::warn!(
                    circuit = %circuit,
                    reason = %reason,
                    "toolchain proving failed; returning placeholder"
                );
                Ok(GeneratedProof::Placeholder(PlaceholderProof {
                    circuit,
                    reason: format!("toolchain failure: {reason}"),
                    generated_at: Utc::now(),
                }))
            }
        }
    }
}

async fn run_command(command: &mut Command, stage: &str) -> Result<(), String> {
    let output = command
        .output()
        .await
        .map_err(|e| format!("{stage} failed to start: {e}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{stage} exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }
    Ok(())
}

/// Assemble fixed-width proof elements from snarkjs decimal points.
///
/// snarkjs emits projective coordinates — G1 points as `[x, y, "1"]` and
/// the G2 point as `[[x0, x1], [y0, y1], ["1", "0"]]`. Only the affine
/// coordinates are encoded.
fn parse_proof(raw: &SnarkjsProof) -> Result<zkr_core::ProofData, String> {
    Ok(zkr_core::ProofData {
        a: g1_bytes(&raw.pi_a)?,
        b: g2_bytes(&raw.pi_b)?,
        c: g1_bytes(&raw.pi_c)?,
    })
}

fn g1_bytes(point: &[String]) -> Result<Vec<u8>, String> {
    if point.len() < 2 {
        return Err(format!("G1 point has {} coordinates, need 2", point.len()));
    }
    let mut out = Vec::with_capacity(64);
    for coord in &point[..2] {
        out.extend_from_slice(&field_element_bytes(coord).map_err(|e| e.to_string())?);
    }
    Ok(out)
}

fn g2_bytes(point: &[Vec<String>]) -> Result<Vec<u8>, String> {
    if point.len() < 2 || point[0].len() < 2 || point[1].len() < 2 {
        return Err("G2 point needs two pairs of coordinates".to_string());
    }
    let mut out = Vec::with_capacity(128);
    for coord in [&point[0][0], &point[0][1], &point[1][0], &point[1][1]] {
        out.extend_from_slice(&field_element_bytes(coord).map_err(|e| e.to_string())?);
    }
    Ok(out)
}
