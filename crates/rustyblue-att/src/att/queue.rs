//! Prepared-write transaction tracking
//!
//! Each connection owns one [`PreparedWriteQueue`]. Successful Prepare Write
//! requests append to it in request order and an Execute Write flushes all of
//! it at once, whatever the flags byte said. Entries are never reordered or
//! merged, because the peer applies offset writes in the order it received
//! them. A fragment the peer refused with an Error Response is dropped.

use super::constants::*;
use super::error::{AttError, AttResult};
use super::types::{PrepareWriteRequest, PrepareWriteResponse};

/// One queued attribute-value fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedWrite {
    pub handle: u16,
    pub offset: u16,
    pub value: Vec<u8>,
}

impl PreparedWrite {
    /// First value byte past this fragment
    pub fn end(&self) -> usize {
        self.offset as usize + self.value.len()
    }
}

impl From<&PrepareWriteRequest<'_>> for PreparedWrite {
    fn from(req: &PrepareWriteRequest<'_>) -> Self {
        Self {
            handle: req.handle,
            offset: req.offset,
            value: req.value.to_vec(),
        }
    }
}

/// Where a connection's prepared-write transaction stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// No pending fragments
    Empty,
    /// At least one fragment awaits Execute Write
    Accumulating,
}

/// How a Prepare Write Response compared with the fragment it answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoStatus {
    /// Same handle, offset and value as the queued fragment
    Matched,
    /// The peer echoed something else for the fragment at `handle`/`offset`
    Mismatch { handle: u16, offset: u16 },
    /// No queued fragment was waiting for a response
    Unsolicited,
}

/// Per-connection ordered queue of prepared writes
#[derive(Debug, Clone)]
pub struct PreparedWriteQueue {
    entries: Vec<PreparedWrite>,
    /// Leading entries whose Prepare Write Response has been checked
    echoed: usize,
    last_echo: Option<EchoStatus>,
    capacity: usize,
}

impl Default for PreparedWriteQueue {
    fn default() -> Self {
        Self::new(ATT_PREPARE_WRITE_QUEUE_SIZE)
    }
}

impl PreparedWriteQueue {
    /// Create an empty queue holding at most `capacity` fragments
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            echoed: 0,
            last_echo: None,
            capacity,
        }
    }

    pub fn state(&self) -> QueueState {
        if self.entries.is_empty() {
            QueueState::Empty
        } else {
            QueueState::Accumulating
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queued fragments in request order
    pub fn entries(&self) -> &[PreparedWrite] {
        &self.entries
    }

    /// Number of queued fragments not yet echoed back by the peer
    pub fn unconfirmed(&self) -> usize {
        self.entries.len() - self.echoed
    }

    /// Furthest value byte covered by the queued fragments of `handle`
    pub fn extent(&self, handle: u16) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.handle == handle)
            .map(PreparedWrite::end)
            .max()
            .unwrap_or(0)
    }

    /// Check that a fragment could be queued, without queueing it
    pub fn admit(&self, handle: u16, offset: u16, len: usize) -> AttResult<()> {
        if self.entries.len() >= self.capacity {
            return Err(AttError::PrepareQueueFull);
        }

        let end = self.extent(handle).max(offset as usize + len);
        if end > ATT_MAX_ATTRIBUTE_LEN {
            return Err(AttError::invalid(format!(
                "queued writes to handle 0x{:04X} would reach byte {}, past maximum attribute length {}",
                handle, end, ATT_MAX_ATTRIBUTE_LEN
            )));
        }
        Ok(())
    }

    /// Append a fragment
    pub fn push(&mut self, entry: PreparedWrite) -> AttResult<()> {
        self.admit(entry.handle, entry.offset, entry.value.len())?;
        self.entries.push(entry);
        Ok(())
    }

    /// Match a Prepare Write Response against the oldest unechoed fragment
    ///
    /// The response answers that fragment's request whether or not it
    /// repeats the same bytes, so the fragment counts as echoed either way.
    /// The outcome is kept for [`last_echo`](Self::last_echo).
    pub fn confirm_echo(&mut self, rsp: &PrepareWriteResponse<'_>) -> EchoStatus {
        let status = match self.entries.get(self.echoed) {
            None => EchoStatus::Unsolicited,
            Some(expected) => {
                self.echoed += 1;
                if expected.handle == rsp.handle
                    && expected.offset == rsp.offset
                    && expected.value == rsp.value
                {
                    EchoStatus::Matched
                } else {
                    EchoStatus::Mismatch {
                        handle: expected.handle,
                        offset: expected.offset,
                    }
                }
            }
        };

        self.last_echo = Some(status);
        status
    }

    /// Outcome of the most recent Prepare Write Response
    pub fn last_echo(&self) -> Option<EchoStatus> {
        self.last_echo
    }

    /// Drop the oldest unechoed fragment after the peer refused it
    pub fn reject_oldest(&mut self) -> Option<PreparedWrite> {
        if self.echoed < self.entries.len() {
            Some(self.entries.remove(self.echoed))
        } else {
            None
        }
    }

    /// Take every queued fragment, leaving the queue empty
    pub fn flush(&mut self) -> Vec<PreparedWrite> {
        self.echoed = 0;
        self.last_echo = None;
        std::mem::take(&mut self.entries)
    }

    /// Discard every queued fragment and return how many there were
    pub fn reset(&mut self) -> usize {
        self.flush().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(handle: u16, offset: u16, len: usize) -> PreparedWrite {
        PreparedWrite {
            handle,
            offset,
            value: vec![0x5A; len],
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut queue = PreparedWriteQueue::default();
        assert_eq!(queue.state(), QueueState::Empty);
        assert_eq!(queue.capacity(), ATT_PREPARE_WRITE_QUEUE_SIZE);

        queue.push(fragment(0x10, 0, 18)).unwrap();
        queue.push(fragment(0x10, 18, 18)).unwrap();
        assert_eq!(queue.state(), QueueState::Accumulating);
        assert_eq!(queue.len(), 2);

        let flushed = queue.flush();
        assert_eq!(flushed.len(), 2);
        assert_eq!(queue.state(), QueueState::Empty);

        // Flushing an empty queue is a legal no-op
        assert!(queue.flush().is_empty());
        assert_eq!(queue.reset(), 0);
    }

    #[test]
    fn test_order_preserved_without_coalescing() {
        let mut queue = PreparedWriteQueue::default();
        queue.push(fragment(0x20, 100, 4)).unwrap();
        queue.push(fragment(0x20, 0, 4)).unwrap();
        queue.push(fragment(0x20, 100, 4)).unwrap();
        queue.push(fragment(0x30, 0, 1)).unwrap();

        let offsets: Vec<(u16, u16)> = queue.flush().iter().map(|e| (e.handle, e.offset)).collect();
        assert_eq!(offsets, vec![(0x20, 100), (0x20, 0), (0x20, 100), (0x30, 0)]);
    }

    #[test]
    fn test_attribute_length_bound() {
        let mut queue = PreparedWriteQueue::default();
        queue.push(fragment(0x40, 500, 12)).unwrap();
        assert_eq!(queue.extent(0x40), 512);
        assert_eq!(queue.extent(0x41), 0);

        assert!(matches!(
            queue.push(fragment(0x40, 507, 6)),
            Err(AttError::InvalidParameter(_))
        ));
        assert!(queue.admit(0x40, 400, 0).is_ok());
        assert!(queue.admit(0x41, 512, 0).is_ok());
        assert!(queue.admit(0x41, 512, 1).is_err());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_capacity() {
        let mut queue = PreparedWriteQueue::new(2);
        queue.push(fragment(1, 0, 1)).unwrap();
        queue.push(fragment(1, 1, 1)).unwrap();
        assert!(matches!(queue.push(fragment(1, 2, 1)), Err(AttError::PrepareQueueFull)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_echo_confirmation() {
        let mut queue = PreparedWriteQueue::default();
        queue.push(PreparedWrite {
            handle: 0x1234,
            offset: 0,
            value: vec![1, 2, 3],
        })
        .unwrap();
        queue.push(PreparedWrite {
            handle: 0x1234,
            offset: 3,
            value: vec![4],
        })
        .unwrap();
        assert_eq!(queue.unconfirmed(), 2);
        assert_eq!(queue.last_echo(), None);

        let first = PrepareWriteResponse {
            handle: 0x1234,
            offset: 0,
            value: &[1, 2, 3],
        };
        assert_eq!(queue.confirm_echo(&first), EchoStatus::Matched);
        assert_eq!(queue.unconfirmed(), 1);

        // Echoing the first fragment again does not match the second
        assert_eq!(
            queue.confirm_echo(&first),
            EchoStatus::Mismatch {
                handle: 0x1234,
                offset: 3
            }
        );
        assert_eq!(queue.unconfirmed(), 0);

        // Nothing left to echo
        assert_eq!(queue.confirm_echo(&first), EchoStatus::Unsolicited);
        assert_eq!(queue.last_echo(), Some(EchoStatus::Unsolicited));
        assert_eq!(queue.len(), 2);

        queue.reset();
        assert_eq!(queue.unconfirmed(), 0);
        assert_eq!(queue.last_echo(), None);
    }

    #[test]
    fn test_reject_oldest_unechoed() {
        let mut queue = PreparedWriteQueue::default();
        queue.push(fragment(0x10, 0, 2)).unwrap();
        queue.push(fragment(0x11, 0, 2)).unwrap();
        queue.push(fragment(0x12, 0, 2)).unwrap();

        let echo = PrepareWriteResponse {
            handle: 0x10,
            offset: 0,
            value: &[0x5A, 0x5A],
        };
        assert_eq!(queue.confirm_echo(&echo), EchoStatus::Matched);

        // The echoed fragment stays, the next one goes
        assert_eq!(queue.reject_oldest().map(|e| e.handle), Some(0x11));
        let handles: Vec<u16> = queue.entries().iter().map(|e| e.handle).collect();
        assert_eq!(handles, vec![0x10, 0x12]);
        assert_eq!(queue.unconfirmed(), 1);

        assert_eq!(queue.reject_oldest().map(|e| e.handle), Some(0x12));
        assert_eq!(queue.reject_oldest(), None);
        assert_eq!(queue.len(), 1);
    }
}
