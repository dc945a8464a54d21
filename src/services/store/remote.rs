use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{BookingStore, StoreError};
use crate::clock::Clock;
use crate::models::{phone_digits, Booking, BookingStatus, NewBooking};

const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// Networked relational store reached through its PostgREST endpoint
/// (`{base_url}/rest/v1/bookings`). Ids and `created_at` are assigned by the
/// server; records are shared by every host pointing at the same project.
pub struct RemoteStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RemoteId {
    Text(String),
    Number(i64),
}

#[derive(Deserialize)]
struct RemoteRow {
    id: RemoteId,
    name: String,
    email: String,
    phone: String,
    service: String,
    date: NaiveDate,
    time: String,
    #[serde(default)]
    notes: Option<String>,
    status: BookingStatus,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<RemoteRow> for Booking {
    fn from(row: RemoteRow) -> Self {
        let id = match row.id {
            RemoteId::Text(s) => s,
            RemoteId::Number(n) => n.to_string(),
        };
        // SQL `time` columns come back as HH:MM:SS
        let time = if row.time.len() == 8 && row.time.ends_with(":00") {
            row.time.get(..5).unwrap_or(&row.time).to_string()
        } else {
            row.time
        };
        Booking {
            id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            service: row.service,
            date: row.date,
            time,
            notes: row.notes.filter(|n| !n.is_empty()),
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at.unwrap_or(row.created_at),
        }
    }
}

#[derive(Serialize)]
struct InsertRow<'a> {
    name: &'a str,
    email: String,
    phone: &'a str,
    service: &'a str,
    date: NaiveDate,
    time: &'a str,
    notes: &'a str,
    status: BookingStatus,
}

impl RemoteStore {
    pub fn new(base_url: String, api_key: String, clock: Arc<dyn Clock>) -> Self {
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
            clock,
        }
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let url = format!("{}/rest/v1/bookings", self.base_url.trim_end_matches('/'));
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch(&self, filters: &[(&str, String)]) -> Result<Vec<Booking>, StoreError> {
        let mut query: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        query.extend(filters.iter().cloned());

        let resp = self
            .request(Method::GET)
            .query(&query)
            .send()
            .await
            .context("failed to reach remote store")?;
        Ok(read_rows(resp, "select").await?)
    }
}

async fn read_rows(resp: Response, operation: &str) -> anyhow::Result<Vec<Booking>> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        // invalid_text_representation: the id filter cannot match any row
        if status == reqwest::StatusCode::BAD_REQUEST
            && body.contains(INVALID_TEXT_REPRESENTATION)
        {
            return Ok(Vec::new());
        }
        anyhow::bail!("remote store {operation} failed ({status}): {body}");
    }
    let rows: Vec<RemoteRow> = resp
        .json()
        .await
        .with_context(|| format!("failed to parse remote store {operation} response"))?;
    Ok(rows.into_iter().map(Booking::from).collect())
}

#[async_trait]
impl BookingStore for RemoteStore {
    async fn create(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let row = InsertRow {
            name: &booking.name,
            email: booking.email.to_lowercase(),
            phone: &booking.phone,
            service: &booking.service,
            date: booking.date,
            time: &booking.time,
            notes: booking.notes.as_deref().unwrap_or(""),
            status: BookingStatus::Pending,
        };

        let resp = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await
            .context("failed to reach remote store")?;

        let created = read_rows(resp, "insert")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("remote store returned no row for insert"))?;

        tracing::info!(booking_id = %created.id, "booking stored remotely");
        Ok(created)
    }

    async fn list_all(&self) -> Result<Vec<Booking>, StoreError> {
        self.fetch(&[]).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        let rows = self.fetch(&[("id", format!("eq.{id}"))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Booking>, StoreError> {
        let email = email.trim().to_lowercase();
        self.fetch(&[("email", format!("eq.{email}"))]).await
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Vec<Booking>, StoreError> {
        let digits = phone_digits(phone);
        if digits.is_empty() {
            return Ok(Vec::new());
        }
        // Stored phones are free-form, so the comparison happens here.
        let all = self.fetch(&[]).await?;
        Ok(all
            .into_iter()
            .filter(|b| phone_digits(&b.phone) == digits)
            .collect())
    }

    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<(), StoreError> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?
            .status;
        if !current.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: status,
            });
        }

        let resp = self
            .request(Method::PATCH)
            .query(&[
                ("id", format!("eq.{id}")),
                ("status", format!("eq.{}", current.as_str())),
            ])
            .header("Prefer", "return=representation")
            .json(&json!({
                "status": status,
                "updated_at": self.clock.now(),
            }))
            .send()
            .await
            .context("failed to reach remote store")?;

        if read_rows(resp, "update").await?.is_empty() {
            // The status moved underneath us; report what it is now.
            return match self.find_by_id(id).await? {
                Some(b) => Err(StoreError::InvalidTransition {
                    from: b.status,
                    to: status,
                }),
                None => Err(StoreError::NotFound(id.to_string())),
            };
        }

        tracing::info!(booking_id = %id, status = %status, "remote booking status updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let resp = self
            .request(Method::DELETE)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .send()
            .await
            .context("failed to reach remote store")?;

        if read_rows(resp, "delete").await?.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tracing::info!(booking_id = %id, "remote booking deleted");
        Ok(())
    }
}
