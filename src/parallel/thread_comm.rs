//! In-process runtime: one OS thread per rank, one mailbox per thread.
//!
//! Sends never block (mailboxes are unbounded), so a combined send+receive
//! posts first and then waits for the matching `(source, tag)` message.
//! Messages that arrive out of order are parked until someone asks for them;
//! messages from one sender with one tag are consumed in the order sent.
//!
//! Collectives reuse the mailboxes with negative tags, which user exchanges
//! never see. A rank that fails broadcasts an abort; any rank waiting on a
//! receive then returns `GwError::Aborted` instead of blocking.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

use super::{Comm, Tag};
use crate::error::{GwError, Result};

const BARRIER_TAG: Tag = -1;
const RELEASE_TAG: Tag = -2;
const REDUCE_TAG: Tag = -3;
const BCAST_TAG: Tag = -4;
const GATHER_TAG: Tag = -5;

enum Message {
    Data { from: usize, tag: Tag, payload: Vec<f64> },
    Abort { from: usize },
}

/// One rank's endpoint of an in-process communicator.
pub struct ThreadComm {
    rank: usize,
    size: usize,
    outboxes: Vec<Sender<Message>>,
    inbox: Receiver<Message>,
    parked: RefCell<VecDeque<(usize, Tag, Vec<f64>)>>,
}

impl ThreadComm {
    /// Build all `size` endpoints of a fresh communicator, indexed by rank.
    pub fn universe(size: usize) -> Result<Vec<ThreadComm>> {
        if size == 0 {
            return Err(GwError::NoProcesses);
        }
        let (outboxes, inboxes): (Vec<_>, Vec<_>) = (0..size).map(|_| mpsc::channel()).unzip();
        Ok(inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ThreadComm {
                rank,
                size,
                outboxes: outboxes.clone(),
                inbox,
                parked: RefCell::new(VecDeque::new()),
            })
            .collect())
    }

    fn post(&self, dest: usize, tag: Tag, payload: Vec<f64>) -> Result<()> {
        let outbox = self
            .outboxes
            .get(dest)
            .ok_or_else(|| GwError::Comm(format!("rank {dest} outside communicator of {}", self.size)))?;
        outbox
            .send(Message::Data { from: self.rank, tag, payload })
            .map_err(|_| GwError::Comm(format!("rank {dest} is gone")))
    }

    fn take(&self, source: usize, tag: Tag) -> Result<Vec<f64>> {
        let mut parked = self.parked.borrow_mut();
        if let Some(pos) = parked.iter().position(|(f, t, _)| *f == source && *t == tag) {
            if let Some((_, _, payload)) = parked.remove(pos) {
                return Ok(payload);
            }
        }
        loop {
            match self.inbox.recv() {
                Ok(Message::Data { from, tag: t, payload }) if from == source && t == tag => {
                    return Ok(payload);
                }
                Ok(Message::Data { from, tag: t, payload }) => parked.push_back((from, t, payload)),
                Ok(Message::Abort { from }) => return Err(GwError::Aborted(from)),
                Err(_) => return Err(GwError::Comm("mailbox closed".into())),
            }
        }
    }

    fn take_scalar(&self, source: usize, tag: Tag) -> Result<f64> {
        self.take(source, tag)?
            .first()
            .copied()
            .ok_or_else(|| GwError::Comm(format!("empty message from rank {source}")))
    }
}

impl Comm for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) -> Result<()> {
        if self.rank == 0 {
            for r in 1..self.size {
                self.take(r, BARRIER_TAG)?;
            }
            for r in 1..self.size {
                self.post(r, RELEASE_TAG, Vec::new())?;
            }
        } else {
            self.post(0, BARRIER_TAG, Vec::new())?;
            self.take(0, RELEASE_TAG)?;
        }
        Ok(())
    }

    fn send_recv(
        &self,
        value: f64,
        dest: Option<usize>,
        source: Option<usize>,
        tag: Tag,
    ) -> Result<Option<f64>> {
        if let Some(d) = dest {
            self.post(d, tag, vec![value])?;
        }
        source.map(|s| self.take_scalar(s, tag)).transpose()
    }

    fn reduce_sum(&self, x: f64, root: usize) -> Result<Option<f64>> {
        if self.rank != root {
            self.post(root, REDUCE_TAG, vec![x])?;
            return Ok(None);
        }
        // Rank order, so the rounding is the same on every run.
        let mut sum = 0.0;
        for r in 0..self.size {
            sum += if r == root { x } else { self.take_scalar(r, REDUCE_TAG)? };
        }
        Ok(Some(sum))
    }

    fn all_reduce(&self, x: f64) -> Result<f64> {
        match self.reduce_sum(x, 0)? {
            Some(sum) => {
                for r in 1..self.size {
                    self.post(r, BCAST_TAG, vec![sum])?;
                }
                Ok(sum)
            }
            None => self.take_scalar(0, BCAST_TAG),
        }
    }

    fn gather(&self, local: &[f64], root: usize) -> Result<Option<Vec<f64>>> {
        if self.rank != root {
            self.post(root, GATHER_TAG, local.to_vec())?;
            return Ok(None);
        }
        let mut out = Vec::with_capacity(local.len() * self.size);
        for r in 0..self.size {
            if r == root {
                out.extend_from_slice(local);
                continue;
            }
            let chunk = self.take(r, GATHER_TAG)?;
            if chunk.len() != local.len() {
                return Err(GwError::Comm(format!(
                    "rank {r} contributed {} values, expected {}",
                    chunk.len(),
                    local.len()
                )));
            }
            out.extend(chunk);
        }
        Ok(Some(out))
    }

    fn abort(&self, code: i32) {
        tracing::error!(rank = self.rank, code, "aborting communicator");
        for (r, outbox) in self.outboxes.iter().enumerate() {
            if r != self.rank {
                // Peers that already finished have dropped their mailbox.
                let _ = outbox.send(Message::Abort { from: self.rank });
            }
        }
    }
}

impl Drop for ThreadComm {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.abort(101);
        }
    }
}

/// Run `f` on `size` ranks, each in its own thread with its own endpoint,
/// and return the per-rank results in rank order.
///
/// A rank whose `f` fails aborts the group. The error reported is the first
/// one that is not a consequence of somebody else's abort.
pub fn run_threaded<T, F>(size: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&ThreadComm) -> Result<T> + Sync,
{
    let comms = ThreadComm::universe(size)?;
    let results: Vec<Result<T>> = std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let f = &f;
                s.spawn(move || {
                    let out = f(&comm);
                    if out.is_err() {
                        comm.abort(1);
                    }
                    out
                })
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, h)| {
                h.join()
                    .map_err(|_| GwError::Comm(format!("rank {rank} panicked")))
                    .and_then(|r| r)
            })
            .collect()
    });

    if results.iter().all(|r| r.is_ok()) {
        return results.into_iter().collect();
    }
    let mut first_abort = None;
    for r in results {
        match r {
            Err(GwError::Aborted(from)) => {
                first_abort.get_or_insert(GwError::Aborted(from));
            }
            Err(e) => return Err(e),
            Ok(_) => {}
        }
    }
    Err(first_abort.unwrap_or_else(|| GwError::Comm("unknown failure".into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_of_zero_is_rejected() {
        assert!(matches!(ThreadComm::universe(0), Err(GwError::NoProcesses)));
    }

    #[test]
    fn neighbors_are_non_periodic() {
        let comms = ThreadComm::universe(3).unwrap();
        assert_eq!(comms[0].neighbors(), (None, Some(1)));
        assert_eq!(comms[1].neighbors(), (Some(0), Some(2)));
        assert_eq!(comms[2].neighbors(), (Some(1), None));
    }

    #[test]
    fn ring_shift_does_not_deadlock() {
        // Every rank sends right and receives from the left in one call.
        let got = run_threaded(5, |comm| {
            let (left, right) = comm.neighbors();
            comm.send_recv(comm.rank() as f64 * 10.0, right, left, 7)
        })
        .unwrap();
        assert_eq!(got, vec![None, Some(0.0), Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn out_of_order_tags_are_parked() {
        let got = run_threaded(2, |comm| {
            if comm.rank() == 0 {
                comm.send_recv(1.0, Some(1), None, 1)?;
                comm.send_recv(2.0, Some(1), None, 2)?;
                Ok(0.0)
            } else {
                let second = comm.send_recv(0.0, None, Some(0), 2)?.unwrap_or(f64::NAN);
                let first = comm.send_recv(0.0, None, Some(0), 1)?.unwrap_or(f64::NAN);
                Ok(second * 10.0 + first)
            }
        })
        .unwrap();
        assert_eq!(got[1], 21.0);
    }

    #[test]
    fn collectives_agree_across_ranks() {
        let got = run_threaded(4, |comm| {
            let r = comm.rank() as f64;
            comm.barrier()?;
            let reduced = comm.reduce_sum(r + 1.0, 0)?;
            let total = comm.all_reduce(r)?;
            let gathered = comm.gather(&[r, -r], 0)?;
            Ok((reduced, total, gathered))
        })
        .unwrap();
        assert_eq!(got[0].0, Some(10.0));
        assert!(got[1..].iter().all(|g| g.0.is_none() && g.2.is_none()));
        assert!(got.iter().all(|g| g.1 == 6.0));
        assert_eq!(
            got[0].2.as_deref(),
            Some(&[0.0, -0.0, 1.0, -1.0, 2.0, -2.0, 3.0, -3.0][..])
        );
    }

    #[test]
    fn failing_rank_unblocks_peers() {
        let err = run_threaded(3, |comm| {
            if comm.rank() == 1 {
                return Err(GwError::InvalidParameter("boom".into()));
            }
            // Would wait forever on rank 1 without the abort broadcast.
            comm.send_recv(0.0, None, Some(1), 3)
        })
        .unwrap_err();
        assert!(matches!(err, GwError::InvalidParameter(_)));
    }
}
