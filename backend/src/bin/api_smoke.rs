//! Smoke test for a running tutor server.
//!
//! Walks one student through create, attendance, invoicing and delete, and
//! exercises the currency endpoints. Prints `PASS`/`FAIL` per check and
//! exits non-zero if any check failed.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

#[derive(Parser, Debug)]
#[command(name = "api-smoke", about = "Smoke-test a running tutor server", long_about = None)]
struct Args {
    /// Server root, without the /api suffix
    #[arg(long, env = "TUTOR_API_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

struct SmokeRunner {
    client: Client,
    api: String,
    passed: usize,
    failed: usize,
}

impl SmokeRunner {
    fn new(args: &Args) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(args.timeout))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api: format!("{}/api", args.base_url.trim_end_matches('/')),
            passed: 0,
            failed: 0,
        })
    }

    fn record<T>(&mut self, name: &str, outcome: Result<T>) -> Option<T> {
        match outcome {
            Ok(value) => {
                println!("PASS  {}", name);
                self.passed += 1;
                Some(value)
            }
            Err(e) => {
                println!("FAIL  {}: {:#}", name, e);
                self.failed += 1;
                None
            }
        }
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Result<Value> {
        let url = format!("{}{}", self.api, path);
        let mut builder = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, url))?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if status != expected {
            bail!("{} {} returned {} (expected {}): {}", method, path, status, expected, text);
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).with_context(|| format!("{} {} returned invalid JSON", method, path))
    }

    async fn create_student(&self) -> Result<String> {
        let body = json!({
            "first_name": "Smoke",
            "last_name": "Test",
            "grade": "10",
            "subjects": ["Mathematics"],
            "parent_contact": { "name": "Smoke Parent" },
            "preferred_currency": "USD"
        });
        let response = self
            .request(reqwest::Method::POST, "/students", Some(body), StatusCode::CREATED)
            .await?;
        response["student"]["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow!("response has no student id"))
    }

    async fn record_attendance(&self, student_id: &str) -> Result<()> {
        let body = json!({
            "student_id": student_id,
            "date": Utc::now().date_naive(),
            "session_type": "online",
            "duration_hours": "2",
            "status": "present"
        });
        self.request(reqwest::Method::POST, "/attendance", Some(body), StatusCode::CREATED)
            .await?;
        Ok(())
    }

    async fn generate_invoice(&self, student_id: &str) -> Result<()> {
        let body = json!({ "student_id": student_id });
        let invoice = self
            .request(reqwest::Method::POST, "/invoices/generate", Some(body), StatusCode::CREATED)
            .await?;
        if invoice["status"] != "draft" {
            bail!("expected a draft invoice, got {}", invoice["status"]);
        }
        if invoice["currency"] != "USD" {
            bail!("expected USD billing, got {}", invoice["currency"]);
        }
        Ok(())
    }

    async fn validate(&self, amount: Value, expect_valid: bool) -> Result<()> {
        let verdict = self
            .request(
                reqwest::Method::POST,
                "/currency/validate",
                Some(json!({ "amount": amount })),
                StatusCode::OK,
            )
            .await?;
        if verdict["is_valid"].as_bool() != Some(expect_valid) {
            bail!("expected is_valid={}, got {}", expect_valid, verdict);
        }
        Ok(())
    }

    async fn convert(&self) -> Result<()> {
        let body = json!({ "amount": "185", "from": "ZAR", "to": "USD" });
        let response = self
            .request(reqwest::Method::POST, "/currency/convert", Some(body), StatusCode::OK)
            .await?;
        if response["formatted"] != "$10.00" {
            bail!("expected $10.00, got {}", response["formatted"]);
        }
        Ok(())
    }

    async fn delete_student(&self, student_id: &str) -> Result<()> {
        self.request(
            reqwest::Method::DELETE,
            &format!("/students/{}", student_id),
            None,
            StatusCode::NO_CONTENT,
        )
        .await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let mut runner = match SmokeRunner::new(&args) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Running smoke checks against {}", runner.api);

    let created = runner.create_student().await;
    if let Some(student_id) = runner.record("create student", created) {
        let outcome = runner.record_attendance(&student_id).await;
        runner.record("record attendance", outcome);
        let outcome = runner.generate_invoice(&student_id).await;
        runner.record("generate invoice", outcome);
        let outcome = runner.delete_student(&student_id).await;
        runner.record("delete student", outcome);
    }

    let outcome = runner.validate(json!(1250.5), true).await;
    runner.record("validate good amount", outcome);
    let outcome = runner.validate(json!("12.345"), false).await;
    runner.record("reject three decimals", outcome);
    let outcome = runner.validate(json!(true), false).await;
    runner.record("reject non-numeric amount", outcome);
    let outcome = runner.convert().await;
    runner.record("convert ZAR to USD", outcome);

    println!("{} passed, {} failed", runner.passed, runner.failed);
    if runner.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
