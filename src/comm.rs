//! Fixed-size worker groups and the point-to-point channels between them.
//!
//! A member of a group knows its own rank and the group size from construction onwards. The
//! only collectives needed are a send to the root, a receive from any source on the root, and a
//! barrier. Every wait is bounded by the group's timeout, so a worker that never shows up is
//! reported as [`Error::CommunicationStall`] instead of blocking forever.
//!
//! [`ThreadComm`] runs a group on the threads of one process. With the `mpi` feature,
//! [`MpiComm`] runs one member per MPI process.

#[cfg(feature = "mpi")]
mod mpi_comm;

#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::Error;

/// The rank that collects results.
pub const ROOT: usize = 0;

/// Default bound on every blocking wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// What a group member is responsible for in a gather.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    /// Receives every other member's partial result and merges them.
    Root,
    /// Sends its partial result to the root and keeps nothing.
    Worker,
}

impl Role {
    #[inline]
    pub fn of(rank: usize) -> Self {
        if rank == ROOT {
            Role::Root
        } else {
            Role::Worker
        }
    }
}

/// A member of a fixed-size worker group exchanging messages of type `T`.
pub trait Communicator<T> {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn role(&self) -> Role {
        Role::of(self.rank())
    }

    /// Sends `msg` to member `dest`.
    fn send(&self, dest: usize, msg: T) -> Result<(), Error>;

    /// Receives the next message from any member, returning the sender's rank with it.
    fn receive_any(&self) -> Result<(usize, T), Error>;

    /// Returns once every member of the group has called `barrier`.
    fn barrier(&self) -> Result<(), Error>;
}

/// A group member backed by in-process channels, for workers running on separate threads.
pub struct ThreadComm<T> {
    rank: usize,
    size: usize,
    role: Role,
    timeout: Option<Duration>,
    inbox: Receiver<(usize, T)>,
    outboxes: Vec<Sender<(usize, T)>>,
    control_in: Receiver<usize>,
    control_out: Vec<Sender<usize>>,
}

impl<T> ThreadComm<T> {
    /// Creates every member of a group of `size`, in rank order.
    ///
    /// `timeout` bounds each blocking wait; `None` waits indefinitely.
    pub fn group(size: usize, timeout: Option<Duration>) -> Result<Vec<Self>, Error> {
        if size == 0 {
            return Err(Error::InvalidGroup { rank: 0, size });
        }
        let (outboxes, inboxes): (Vec<Sender<(usize, T)>>, Vec<_>) =
            (0..size).map(|_| mpsc::channel()).unzip();
        let (control_out, control_ins): (Vec<Sender<usize>>, Vec<_>) =
            (0..size).map(|_| mpsc::channel()).unzip();

        Ok(inboxes
            .into_iter()
            .zip(control_ins)
            .enumerate()
            .map(|(rank, (inbox, control_in))| Self {
                rank,
                size,
                role: Role::of(rank),
                timeout,
                inbox,
                outboxes: outboxes.clone(),
                control_in,
                control_out: control_out.clone(),
            })
            .collect())
    }

    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn wait<M>(&self, rx: &Receiver<M>, phase: &'static str) -> Result<M, Error> {
        let rank = self.rank;
        match self.timeout {
            Some(timeout) => rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => Error::CommunicationStall { rank, phase },
                RecvTimeoutError::Disconnected => Error::Disconnected { rank, phase },
            }),
            None => rx.recv().map_err(|_| Error::Disconnected { rank, phase }),
        }
    }

    fn peer<'a, M>(&self, peers: &'a [Sender<M>], dest: usize) -> Result<&'a Sender<M>, Error> {
        peers.get(dest).ok_or(Error::InvalidGroup {
            rank: dest,
            size: self.size,
        })
    }
}

impl<T> Communicator<T> for ThreadComm<T> {
    #[inline]
    fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn role(&self) -> Role {
        self.role
    }

    fn send(&self, dest: usize, msg: T) -> Result<(), Error> {
        self.peer(&self.outboxes, dest)?
            .send((self.rank, msg))
            .map_err(|_| Error::Disconnected {
                rank: self.rank,
                phase: "sending",
            })
    }

    fn receive_any(&self) -> Result<(usize, T), Error> {
        self.wait(&self.inbox, "collecting")
    }

    fn barrier(&self) -> Result<(), Error> {
        let phase = "synchronizing";
        match self.role {
            Role::Root => {
                for _ in 1..self.size {
                    self.wait(&self.control_in, phase)?;
                }
                for peer in self.control_out.iter().skip(1) {
                    peer.send(ROOT).map_err(|_| Error::Disconnected {
                        rank: self.rank,
                        phase,
                    })?;
                }
            }
            Role::Worker => {
                self.peer(&self.control_out, ROOT)?
                    .send(self.rank)
                    .map_err(|_| Error::Disconnected {
                        rank: self.rank,
                        phase,
                    })?;
                self.wait(&self.control_in, phase)?;
            }
        }
        Ok(())
    }
}

/// Runs `f` once per member of a new group of `size`, each on its own thread, and returns the
/// results in rank order.
pub fn launch<T, R, F>(size: usize, timeout: Option<Duration>, f: F) -> Result<Vec<R>, Error>
where
    T: Send,
    R: Send,
    F: Fn(ThreadComm<T>) -> R + Sync,
{
    let comms = ThreadComm::<T>::group(size, timeout)?;
    let f = &f;
    Ok(std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| s.spawn(move || f(comm)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roles_follow_rank() {
        let group = ThreadComm::<()>::group(3, None).unwrap();
        let roles: Vec<_> = group.iter().map(|c| c.role()).collect();
        assert_eq!(roles, vec![Role::Root, Role::Worker, Role::Worker]);
    }

    #[test]
    fn empty_group_is_rejected() {
        assert!(matches!(
            ThreadComm::<()>::group(0, None),
            Err(Error::InvalidGroup { size: 0, .. })
        ));
    }

    #[test]
    fn messages_carry_their_source() {
        let sums = launch(4, Some(Duration::from_secs(5)), |comm: ThreadComm<usize>| {
            if comm.role() == Role::Root {
                let mut sources = Vec::new();
                for _ in 1..comm.size() {
                    let (from, value) = comm.receive_any().unwrap();
                    assert_eq!(value, 10 * from);
                    sources.push(from);
                }
                sources.sort();
                comm.barrier().unwrap();
                sources
            } else {
                comm.send(ROOT, 10 * comm.rank()).unwrap();
                comm.barrier().unwrap();
                Vec::new()
            }
        })
        .unwrap();
        assert_eq!(sums[0], vec![1, 2, 3]);
    }

    #[test]
    fn missing_worker_stalls_with_an_error() {
        let mut group = ThreadComm::<u8>::group(2, Some(Duration::from_millis(50))).unwrap();
        let _silent = group.pop();
        let root = group.pop().unwrap();
        assert!(matches!(
            root.receive_any(),
            Err(Error::CommunicationStall { rank: 0, phase: "collecting" })
        ));
        assert!(matches!(root.barrier(), Err(Error::CommunicationStall { rank: 0, .. })));
    }

    #[test]
    fn send_to_unknown_rank_fails() {
        let group = ThreadComm::<u8>::group(2, None).unwrap();
        assert!(matches!(group[1].send(5, 0), Err(Error::InvalidGroup { rank: 5, size: 2 })));
    }
}
