//! Live playlist polling.
//!
//! Each refresh scans the fetched manifest from scratch. Tags are printed only
//! when the URI lines that follow them have not been printed before, so a
//! sliding live window shows up as a stream of new segments.

use std::io::Write;
use std::mem;
use std::time::Duration;

use hlsq_core::{Scanner, Serializer, Tag};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::config::PollConfig;
use crate::error::Result;
use crate::fetch::ManifestFetcher;

const ENDLIST: &str = "#EXT-X-ENDLIST";

/// The non-blank trailing lines of a tag, trimmed and joined by newlines.
/// Tags without such lines have no identity.
pub fn content_identity(tag: &Tag) -> Option<String> {
    let lines: Vec<&str> = tag
        .trailing
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn is_endlist(tag: &Tag) -> bool {
    tag.name.trim().eq_ignore_ascii_case(ENDLIST)
}

/// Decides which tags of a refreshed manifest are new.
///
/// On the first refresh everything passes. Afterwards the playlist header
/// (identity-less tags before the first tag with an identity) is dropped, and
/// identity-less tags between segments are held until the next tag that has
/// one and share its fate.
pub struct SegmentDedup {
    seen: Cache<String, ()>,
    first_tick: bool,
    in_header: bool,
    held: Vec<Tag>,
}

impl SegmentDedup {
    pub fn new(capacity: u64) -> Self {
        let seen = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self {
            seen,
            first_tick: true,
            in_header: true,
            held: Vec::new(),
        }
    }

    /// Returns the tags that should be printed now, in manifest order.
    pub fn offer(&mut self, tag: Tag) -> Vec<Tag> {
        let identity = content_identity(&tag);

        if self.first_tick {
            if let Some(identity) = identity {
                self.seen.insert(identity, ());
            }
            return vec![tag];
        }

        let Some(identity) = identity else {
            if self.in_header {
                trace!(tag = %tag.name, "Skipping playlist header");
            } else {
                self.held.push(tag);
            }
            return Vec::new();
        };
        self.in_header = false;

        let mut group = mem::take(&mut self.held);
        if self.seen.contains_key(&identity) {
            trace!(identity = %identity, dropped = group.len() + 1, "Already printed");
            return Vec::new();
        }
        self.seen.insert(identity, ());
        group.push(tag);
        group
    }

    /// Closes a refresh. Held tags are released only when the playlist ended.
    pub fn end_tick(&mut self, ended: bool) -> Vec<Tag> {
        self.first_tick = false;
        self.in_header = true;
        let held = mem::take(&mut self.held);
        if ended { held } else { Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub written: usize,
    pub ended: bool,
}

pub struct Poller {
    fetcher: ManifestFetcher,
    serializer: Serializer,
    dedup: SegmentDedup,
    interval: Duration,
    max_refresh_retries: u32,
}

impl Poller {
    pub fn new(fetcher: ManifestFetcher, serializer: Serializer, config: &PollConfig) -> Self {
        Self {
            fetcher,
            serializer,
            dedup: SegmentDedup::new(config.seen_capacity),
            interval: config.interval(),
            max_refresh_retries: config.max_refresh_retries,
        }
    }

    /// Scans one fetched manifest and writes the tags that are new.
    pub fn emit_tick<W: Write + ?Sized>(&mut self, body: &str, out: &mut W) -> Result<TickOutcome> {
        let mut outcome = TickOutcome::default();
        for tag in Scanner::new(body.as_bytes()) {
            let tag = tag?;
            outcome.ended |= is_endlist(&tag);
            for tag in self.dedup.offer(tag) {
                if self.serializer.write(out, tag)? {
                    outcome.written += 1;
                }
            }
        }
        for tag in self.dedup.end_tick(outcome.ended) {
            if self.serializer.write(out, tag)? {
                outcome.written += 1;
            }
        }
        out.flush()?;
        Ok(outcome)
    }

    /// Refreshes `url` until the playlist ends, the token is cancelled, or
    /// more than `max_refresh_retries` refreshes in a row fail.
    pub async fn run<W: Write + ?Sized>(
        &mut self,
        url: &Url,
        out: &mut W,
        token: CancellationToken,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut retries = 0u32;

        info!(%url, interval = ?self.interval, "Polling playlist");
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!(%url, "Polling cancelled");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!(%url, "Polling cancelled");
                    return Ok(());
                }
                fetched = self.fetcher.fetch(url) => fetched,
            };

            match fetched {
                Ok(body) => {
                    retries = 0;
                    let outcome = self.emit_tick(&body, out)?;
                    debug!(%url, written = outcome.written, "Playlist refreshed");
                    if outcome.ended {
                        info!(%url, "ENDLIST reached. Stopping polling.");
                        return Ok(());
                    }
                }
                Err(e) => {
                    retries += 1;
                    if retries > self.max_refresh_retries {
                        error!(%url, retries, "Giving up on playlist: {e}");
                        return Err(e);
                    }
                    warn!(%url, attempt = retries, "Error refreshing playlist: {e}");
                }
            }
        }
    }
}
