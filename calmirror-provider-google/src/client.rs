//! Calendar v3 REST client.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use calmirror_core::{
    CalMirrorError, CalMirrorResult, CalendarClient, Event, EventFilter, NewEvent, TimeWindow,
};
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::session::Session;
use crate::wire::{EventsPage, GoogleEvent, listed_events};

const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Largest page `events.list` accepts.
const PAGE_SIZE: &str = "2500";

/// One calendar, accessed with one stored OAuth session.
pub struct GoogleCalendar {
    http: reqwest::Client,
    calendar_id: String,
    timeout: Duration,
    session: Mutex<Session>,
}

impl GoogleCalendar {
    /// Load (and refresh if needed) the session stored under `account`.
    pub async fn connect(account: &str, calendar_id: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::new();
        let session = tokio::time::timeout(timeout, Session::load_valid(account, &http))
            .await
            .map_err(|_| anyhow::anyhow!("Refreshing session for '{account}' timed out"))??;

        Ok(GoogleCalendar {
            http,
            calendar_id: calendar_id.to_string(),
            timeout,
            session: Mutex::new(session),
        })
    }

    fn events_url(&self, event_id: Option<&str>) -> Result<Url> {
        events_url(&self.calendar_id, event_id)
    }

    async fn access_token(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        if session.is_expired() {
            session.refresh(&self.http).await?;
        }
        Ok(session.access_token().to_string())
    }

    /// Run `call` under the request timeout and map failures to API errors.
    async fn attempt<T, F>(&self, what: &str, call: F) -> CalMirrorResult<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CalMirrorError::Api(format!("{what}: {e:#}"))),
            Err(_) => Err(CalMirrorError::Api(format!(
                "{what}: timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }

    async fn list_all(&self, window: &TimeWindow, filter: &EventFilter) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.events_url(None)?;
            append_query(&mut url, window, filter, page_token.as_deref());

            let token = self.access_token().await?;
            let response = self
                .http
                .get(url)
                .bearer_auth(token)
                .send()
                .await
                .context("Failed to send list request")?;

            let page: EventsPage = checked(response)
                .await?
                .json()
                .await
                .context("Failed to parse event list")?;

            events.extend(listed_events(page.items));

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!("Listed {} event(s) from {}", events.len(), self.calendar_id);
        Ok(events)
    }

    async fn insert(&self, event: &NewEvent) -> Result<Event> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.events_url(None)?)
            .bearer_auth(token)
            .json(&GoogleEvent::from(event))
            .send()
            .await
            .context("Failed to send insert request")?;

        let created: GoogleEvent = checked(response)
            .await?
            .json()
            .await
            .context("Failed to parse created event")?;
        Event::try_from(created)
    }

    async fn remove(&self, event_id: &str) -> Result<()> {
        let token = self.access_token().await?;
        let response = self
            .http
            .delete(self.events_url(Some(event_id))?)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send delete request")?;

        if is_already_gone(response.status()) {
            debug!("Event {event_id} was already deleted");
            return Ok(());
        }

        checked(response).await?;
        Ok(())
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendar {
    async fn list_events(
        &self,
        window: &TimeWindow,
        filter: &EventFilter,
    ) -> CalMirrorResult<Vec<Event>> {
        self.attempt(
            &format!("Listing events in {}", self.calendar_id),
            self.list_all(window, filter),
        )
        .await
    }

    async fn create_event(&self, event: &NewEvent) -> CalMirrorResult<Event> {
        self.attempt(&format!("Creating {event}"), self.insert(event))
            .await
    }

    async fn delete_event(&self, event_id: &str) -> CalMirrorResult<()> {
        self.attempt(&format!("Deleting {event_id}"), self.remove(event_id))
            .await
    }

    fn describe(&self, event: &Event) -> String {
        format!("{event} ({})", event.id)
    }
}

fn events_url(calendar_id: &str, event_id: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(API_BASE)?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Invalid API base URL"))?;
        segments.extend(["calendars", calendar_id, "events"]);
        if let Some(id) = event_id {
            segments.push(id);
        }
    }
    Ok(url)
}

fn append_query(url: &mut Url, window: &TimeWindow, filter: &EventFilter, page_token: Option<&str>) {
    let mut query = url.query_pairs_mut();
    query
        .append_pair("timeMin", &window.min.to_rfc3339())
        .append_pair("timeMax", &window.max.to_rfc3339())
        .append_pair("singleEvents", "true")
        .append_pair("maxResults", PAGE_SIZE);

    match filter {
        EventFilter::TextSearch(q) => {
            query.append_pair("q", q);
        }
        EventFilter::PrivateProperty { key, value } => {
            query.append_pair("privateExtendedProperty", &format!("{key}={value}"));
        }
    }

    if let Some(token) = page_token {
        query.append_pair("pageToken", token);
    }
}

fn is_already_gone(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::GONE
}

async fn checked(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{status} - {body}")
}
