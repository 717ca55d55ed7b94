//! Scripted in-memory transport for grabber tests.

use crate::grabber::client::Transport;
use crate::grabber::error::GrabberError;
use std::collections::VecDeque;
use std::io::{Cursor, Read};

/// Replies with queued bodies in order and records every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: VecDeque<Result<String, u16>>,
    pub requests: Vec<(String, Option<String>)>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a 200 response with this body.
    pub fn reply(mut self, body: impl Into<String>) -> Self {
        self.replies.push_back(Ok(body.into()));
        self
    }

    /// Queue an HTTP error status.
    pub fn fail(mut self, status: u16) -> Self {
        self.replies.push_back(Err(status));
        self
    }

    pub fn urls(&self) -> Vec<&str> {
        self.requests.iter().map(|(url, _)| url.as_str()).collect()
    }
}

impl Transport for ScriptedTransport {
    fn get(&mut self, url: &str, referer: Option<&str>) -> Result<Box<dyn Read>, GrabberError> {
        self.requests
            .push((url.to_string(), referer.map(String::from)));
        match self.replies.pop_front() {
            Some(Ok(body)) => Ok(Box::new(Cursor::new(body.into_bytes()))),
            Some(Err(status)) => Err(GrabberError::HttpStatus {
                status,
                url: url.to_string(),
            }),
            None => Err(GrabberError::HttpStatus {
                status: 599,
                url: url.to_string(),
            }),
        }
    }
}
