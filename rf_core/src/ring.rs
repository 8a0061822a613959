//! Lock-free single-producer single-consumer ring buffer over shared memory.
//!
//! This is the cross-process audio data plane: one receiver process writes
//! decimated mono `f32` samples, the mixer process reads them, and no lock
//! is ever taken on the hot path. The layout is a small fixed header
//! (capacity, head, tail) immediately followed by the sample storage, all
//! inside a single `memmap2`-mapped file so that unrelated processes can
//! attach to the same region by path alone.
//!
//! Head and tail are read and written with plain atomic loads/stores under
//! Acquire/Release ordering — never compare-and-swap, since single-producer
//! single-consumer discipline guarantees there is no contention to resolve.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU32, Ordering},
    thread,
    time::Duration,
};

use memmap2::MmapMut;

use crate::error::{Result, ScannerError};

/// Maximum time a blocking `write` will retry before giving up a slot.
const WRITE_BLOCK_POLL: Duration = Duration::from_millis(1);

#[repr(C)]
struct RingHeader {
    capacity: AtomicU32,
    head: AtomicU32,
    tail: AtomicU32,
}

const HEADER_BYTES: usize = std::mem::size_of::<RingHeader>();

fn region_bytes(capacity: usize) -> usize {
    HEADER_BYTES + capacity * std::mem::size_of::<f32>()
}

/// Creates the backing file for a shared ring of `capacity` samples at `path`.
///
/// Called once, by the supervisor, before any receiver or mixer process is
/// spawned. The returned path is what gets handed to the child processes as
/// a command-line argument — this implementation's stand-in for "inherited
/// handles."
pub fn create(path: &Path, capacity: usize) -> Result<()> {
    let capacity = capacity.next_power_of_two().max(1);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| ScannerError::Device(format!("failed to create ring file {path:?}: {e}")))?;
    file.set_len(region_bytes(capacity) as u64)
        .map_err(|e| ScannerError::Device(format!("failed to size ring file {path:?}: {e}")))?;

    let mut mmap = unsafe {
        MmapMut::map_mut(&file).map_err(|e| ScannerError::Device(format!("failed to map ring file {path:?}: {e}")))?
    };
    let header = header_mut(&mut mmap);
    header.capacity.store(capacity as u32, Ordering::Relaxed);
    header.head.store(0, Ordering::Relaxed);
    header.tail.store(0, Ordering::Relaxed);
    Ok(())
}

fn header_mut(mmap: &mut MmapMut) -> &mut RingHeader {
    debug_assert!(mmap.len() >= HEADER_BYTES);
    unsafe { &mut *(mmap.as_mut_ptr() as *mut RingHeader) }
}

fn header(mmap: &MmapMut) -> &RingHeader {
    debug_assert!(mmap.len() >= HEADER_BYTES);
    unsafe { &*(mmap.as_ptr() as *const RingHeader) }
}

fn data_ptr(mmap: &MmapMut) -> *const f32 {
    unsafe { mmap.as_ptr().add(HEADER_BYTES) as *const f32 }
}

fn data_ptr_mut(mmap: &mut MmapMut) -> *mut f32 {
    unsafe { mmap.as_mut_ptr().add(HEADER_BYTES) as *mut f32 }
}

fn open_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| ScannerError::Device(format!("failed to open ring file {path:?}: {e}")))
}

fn open_mmap(path: &Path) -> Result<MmapMut> {
    let file = open_file(path)?;
    unsafe { MmapMut::map_mut(&file).map_err(|e| ScannerError::Device(format!("failed to map ring file {path:?}: {e}"))) }
}

/// The sole writer of a shared ring. Constructed by a receiver process after
/// the supervisor has already called [`create`] on the same path.
pub struct RingProducer {
    mmap: MmapMut,
    capacity: usize,
    path: PathBuf,
}

impl RingProducer {
    /// Attaches to an existing shared ring at `path`.
    pub fn attach(path: &Path) -> Result<Self> {
        let mmap = open_mmap(path)?;
        let capacity = header(&mmap).capacity.load(Ordering::Relaxed) as usize;
        Ok(Self {
            mmap,
            capacity,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Writes as many samples as fit, reserving one slot to disambiguate
    /// the full/empty case. If `block_on_full` is set, retries for up to
    /// 1 ms per iteration until all samples are written; otherwise returns
    /// as soon as the ring has no more room.
    pub fn write(&mut self, samples: &[f32], block_on_full: bool) -> usize {
        let mut written = 0;
        while written < samples.len() {
            let head = header(&self.mmap).head.load(Ordering::Relaxed) as usize;
            let tail = header(&self.mmap).tail.load(Ordering::Acquire) as usize;

            let mut space_left = if head < tail {
                tail - head - 1
            } else {
                let mut s = self.capacity - head;
                if tail == 0 {
                    s -= 1;
                }
                s
            };
            if space_left == 0 {
                if !block_on_full {
                    return written;
                }
                thread::sleep(WRITE_BLOCK_POLL);
                continue;
            }

            let remaining = samples.len() - written;
            if space_left > remaining {
                space_left = remaining;
            }

            let dst = data_ptr_mut(&mut self.mmap);
            for i in 0..space_left {
                unsafe { *dst.add(head + i) = samples[written + i] };
            }

            written += space_left;
            let new_head = head + space_left;
            let new_head = if new_head >= self.capacity { 0 } else { new_head };
            header(&self.mmap).head.store(new_head as u32, Ordering::Release);
        }
        written
    }
}

/// The sole reader of a shared ring. Constructed by the mixer process.
pub struct RingConsumer {
    mmap: MmapMut,
    capacity: usize,
    path: PathBuf,
}

impl RingConsumer {
    /// Attaches to an existing shared ring at `path`.
    pub fn attach(path: &Path) -> Result<Self> {
        let mmap = open_mmap(path)?;
        let capacity = header(&mmap).capacity.load(Ordering::Relaxed) as usize;
        Ok(Self {
            mmap,
            capacity,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reads from `tail` up to either `head` or the end of the buffer,
    /// whichever comes first, appending into `out`. A full drain across a
    /// wrap boundary may require two calls. Never blocks — an empty ring
    /// simply yields zero.
    pub fn read(&mut self, out: &mut Vec<f32>) -> usize {
        let head = header(&self.mmap).head.load(Ordering::Acquire) as usize;
        let tail = header(&self.mmap).tail.load(Ordering::Relaxed) as usize;

        let new_items = if head >= tail { head - tail } else { self.capacity - tail };
        if new_items == 0 {
            return 0;
        }

        let src = data_ptr(&self.mmap);
        out.reserve(new_items);
        for i in 0..new_items {
            out.push(unsafe { *src.add(tail + i) });
        }

        let mut new_tail = tail + new_items;
        if new_tail >= self.capacity {
            new_tail = 0;
        }
        header(&self.mmap).tail.store(new_tail as u32, Ordering::Release);
        new_items
    }
}

/// Model-checks the head/tail indexing protocol in isolation from the
/// `memmap2` storage: loom's atomics can't be laid out over mapped file
/// bytes via the `RingHeader` pointer cast, so this mirrors the same
/// capacity/wrap arithmetic as [`RingProducer::write`] and
/// [`RingConsumer::read`] over a plain heap buffer instead.
#[cfg(loom)]
mod loom_tests {
    use std::cell::UnsafeCell;

    use loom::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
    };

    struct LoomRing {
        data: Box<[UnsafeCell<f32>]>,
        capacity: usize,
        head: AtomicUsize,
        tail: AtomicUsize,
    }

    unsafe impl Sync for LoomRing {}

    impl LoomRing {
        fn new(capacity: usize) -> Self {
            let capacity = capacity.next_power_of_two().max(1);
            Self {
                data: (0..capacity).map(|_| UnsafeCell::new(0.0)).collect(),
                capacity,
                head: AtomicUsize::new(0),
                tail: AtomicUsize::new(0),
            }
        }

        fn write(&self, samples: &[f32]) -> usize {
            let head = self.head.load(Ordering::Relaxed);
            let tail = self.tail.load(Ordering::Acquire);
            let space_left = if head < tail {
                tail - head - 1
            } else {
                let mut s = self.capacity - head;
                if tail == 0 {
                    s -= 1;
                }
                s
            };
            let n = space_left.min(samples.len());
            for (i, &s) in samples.iter().take(n).enumerate() {
                unsafe { *self.data[head + i].get() = s };
            }
            let mut new_head = head + n;
            if new_head >= self.capacity {
                new_head = 0;
            }
            self.head.store(new_head, Ordering::Release);
            n
        }

        fn read(&self, out: &mut Vec<f32>) -> usize {
            let head = self.head.load(Ordering::Acquire);
            let tail = self.tail.load(Ordering::Relaxed);
            let new_items = if head >= tail { head - tail } else { self.capacity - tail };
            for i in 0..new_items {
                out.push(unsafe { *self.data[tail + i].get() });
            }
            let mut new_tail = tail + new_items;
            if new_tail >= self.capacity {
                new_tail = 0;
            }
            self.tail.store(new_tail, Ordering::Release);
            new_items
        }
    }

    #[test]
    fn loom_single_write_is_visible_to_read() {
        loom::model(|| {
            let ring = Arc::new(LoomRing::new(4));

            let producer = {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    ring.write(&[1.0, 2.0]);
                })
            };
            let consumer = {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    let mut out = Vec::new();
                    ring.read(&mut out);
                    out
                })
            };

            producer.join().unwrap();
            let received = consumer.join().unwrap();
            // Whatever the consumer observed must be a prefix of what was
            // written: no torn or out-of-order reads across the head/tail
            // handoff.
            assert!(received.len() <= 2);
            assert_eq!(&received[..], &[1.0, 2.0][..received.len()]);
        });
    }

    #[test]
    fn loom_never_overruns_capacity() {
        loom::model(|| {
            let ring = Arc::new(LoomRing::new(2));

            let producer = {
                let ring = Arc::clone(&ring);
                thread::spawn(move || ring.write(&[1.0, 2.0, 3.0]))
            };

            let written = producer.join().unwrap();
            assert!(written <= 1);
        });
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn ring_pair(capacity: usize) -> (tempfile::TempDir, RingProducer, RingConsumer) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ring.bin");
        create(&path, capacity).unwrap();
        let producer = RingProducer::attach(&path).unwrap();
        let consumer = RingConsumer::attach(&path).unwrap();
        (dir, producer, consumer)
    }

    #[test]
    fn capacity_rounds_to_power_of_two() {
        let (_dir, producer, _consumer) = ring_pair(5);
        assert_eq!(producer.capacity(), 8);
    }

    #[test]
    fn basic_write_read_round_trip() {
        let (_dir, mut producer, mut consumer) = ring_pair(8);
        let written = producer.write(&[1.0, 2.0, 3.0], true);
        assert_eq!(written, 3);

        let mut out = Vec::new();
        let read = consumer.read(&mut out);
        assert_eq!(read, 3);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
    }

    /// Capacity 8, fill to 7: a non-blocking write cannot claim the
    /// reserved wrap slot. Drain 4, then confirm the next writes wrap into
    /// indices [7, 0, 1, 2].
    #[test]
    fn ring_full_then_wraps() {
        let (_dir, mut producer, mut consumer) = ring_pair(8);

        let written = producer.write(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], true);
        assert_eq!(written, 7);

        // One more sample cannot fit: head=7, tail=0, space_left = 8-7-1 = 0.
        let written = producer.write(&[8.0], false);
        assert_eq!(written, 0);

        let mut out = Vec::new();
        let read = consumer.read(&mut out);
        assert_eq!(read, 7);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);

        // tail is now 7 (all 7 drained in one call since head(7) >= tail(0) read to head).
        // Ring is now empty; write 4 more, which should wrap around.
        let written = producer.write(&[10.0, 20.0, 30.0, 40.0], true);
        assert_eq!(written, 4);

        let mut out2 = Vec::new();
        consumer.read(&mut out2);
        assert_eq!(out2, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn no_overwrite_before_consumer_tail() {
        let (_dir, mut producer, mut consumer) = ring_pair(4);
        producer.write(&[1.0, 2.0, 3.0], true);

        let mut out = Vec::new();
        consumer.read(&mut out);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);

        // Overfilling must never silently clobber unread data: with a fresh
        // consumer tail caught up, a full-capacity write should succeed
        // cleanly (minus the one reserved slot).
        let written = producer.write(&[4.0, 5.0, 6.0, 7.0], false);
        assert_eq!(written, 3);
    }

    #[test]
    fn empty_ring_read_returns_zero() {
        let (_dir, _producer, mut consumer) = ring_pair(8);
        let mut out = Vec::new();
        assert_eq!(consumer.read(&mut out), 0);
        assert!(out.is_empty());
    }
}
