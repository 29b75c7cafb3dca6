use std::time::{Duration, Instant};
use log::{debug, info, trace};
use crate::comm::{
    CommunicationBuffer, Communicator, ExportIndex, GravityRequest, GravityResult, MessageTag, SendCounts,
};
use crate::particles::Particle;
use crate::potential::{apply_potential_corrections, ExportFlags, GravityParameters, HypercubeSchedule, PotentialTree};
use crate::utils::{GravityError, HighPrecision, NUM_PARTICLE_TYPES};

/// Summary of one `compute_potential` call on one task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PotentialReport {
    /// Scan/exchange rounds until every task was done.
    pub passes: usize,
    /// Largest number of export records staged in a single pass.
    pub max_exports_per_pass: usize,
    /// Records sent to other tasks.
    pub exported: usize,
    /// Records received and evaluated for other tasks.
    pub imported: usize,
    pub exchange_batches: usize,
    pub elapsed: Duration,
}

/// Computes the gravitational potential of all particles on all tasks.
///
/// Every task of the run calls [`PotentialPipeline::compute_potential`]
/// collectively. Each task evaluates its own particles against its local
/// tree, ships particles that need data from other tasks in bounded
/// batches, evaluates what it receives, and merges the returned partial
/// potentials before applying the final corrections.
pub struct PotentialPipeline<'a, T, C: ?Sized, P: ?Sized> {
    params: &'a GravityParameters<T>,
    comm: &'a C,
    tree: &'a P,
}

/// Working buffers of one pipeline invocation, all sized to the bunch size.
struct ExchangeBuffers<T> {
    index: ExportIndex,
    staging: CommunicationBuffer<GravityRequest<T>>,
    export: CommunicationBuffer<GravityRequest<T>>,
    import: CommunicationBuffer<GravityRequest<T>>,
    results: CommunicationBuffer<GravityResult<T>>,
    returned: CommunicationBuffer<GravityResult<T>>,
}

impl<T: HighPrecision> ExchangeBuffers<T> {
    fn new(capacity: usize) -> Self {
        Self {
            index: ExportIndex::new(capacity),
            staging: CommunicationBuffer::new(capacity),
            export: CommunicationBuffer::new(capacity),
            import: CommunicationBuffer::new(capacity),
            results: CommunicationBuffer::new(capacity),
            returned: CommunicationBuffer::new(capacity),
        }
    }
}

impl<'a, T, C, P> PotentialPipeline<'a, T, C, P>
where
    T: HighPrecision,
    C: Communicator + ?Sized,
    P: PotentialTree<T> + ?Sized,
{
    /// # Errors
    /// Fails on invalid parameters, or when the bunch size cannot hold one
    /// export per task beyond the scan threshold (`bunch_size <= NTask`).
    pub fn new(params: &'a GravityParameters<T>, comm: &'a C, tree: &'a P) -> Result<Self, GravityError> {
        params.validate()?;
        if params.bunch_size <= comm.size() {
            return Err(GravityError::InvalidParameter(format!(
                "bunch_size {} must exceed the number of tasks {}",
                params.bunch_size,
                comm.size()
            )));
        }
        Ok(Self { params, comm, tree })
    }

    /// Computes the potential of `particles` (this task's shard) at scale
    /// factor or time `time`.
    ///
    /// The local tree evaluation assigns `potential`, so any value set before
    /// the call is discarded; contributions returned by other tasks are then
    /// added on top before the corrections are applied.
    pub fn compute_potential(&self, particles: &mut [Particle<T>], time: T) -> Result<PotentialReport, GravityError> {
        let start = Instant::now();
        let rank = self.comm.rank();
        let ntask = self.comm.size();
        let capacity = self.params.bunch_size;

        let mut remaining = self.check_topology(particles.len())?;

        if rank == 0 {
            info!("Start computation of potential for all particles...");
        }

        let table = self.params.softening_table(time);
        let mut buffers = ExchangeBuffers::new(capacity);
        let mut flags = ExportFlags::new(ntask);
        let mut report = PotentialReport::default();
        let mut next = 0;

        while remaining > 0 {
            report.passes += 1;
            buffers.index.clear();
            let mut send_local = vec![0usize; ntask];

            let first = next;
            while next < particles.len() && buffers.index.len() < capacity - ntask {
                flags.reset();
                let particle = &particles[next];
                let softening = self.params.interaction_softening(&table, particle.ptype, own_softening(particle))?;
                let local = self.tree.evaluate_local(particle, softening, &mut flags);

                let request = self.request_for(particle);
                for task in flags.iter_set().filter(|&task| task != rank) {
                    let slot = buffers.index.push(task, next)?;
                    buffers.staging.write(slot, &request)?;
                    send_local[task] += 1;
                }
                particles[next].potential = local;
                next += 1;
            }
            let done = next - first;

            let nexport = buffers.index.len();
            report.max_exports_per_pass = report.max_exports_per_pass.max(nexport);
            report.exported += nexport;
            debug!("task {}: pass {} evaluated {} particles, {} exports", rank, report.passes, done, nexport);

            buffers.index.sort_by_destination();
            for (slot, entry) in buffers.index.entries().iter().enumerate() {
                buffers.export.copy_slot_from(slot, &buffers.staging, entry.sort_index)?;
            }
            let offsets = ExportIndex::offsets(&send_local);
            let counts = SendCounts::exchange(self.comm, &send_local)?;

            let imported = self.exchange(&counts, &offsets, &mut buffers, particles, &table, &mut report)?;
            report.imported += imported;

            let done_counts = self.comm.all_gather(&[done as u64])?;
            let finished: u64 = done_counts.iter().sum();
            remaining = remaining.saturating_sub(finished);
        }

        apply_potential_corrections(self.params, &table, particles)?;

        if rank == 0 {
            info!("potential done.");
        }
        report.elapsed = start.elapsed();
        Ok(report)
    }

    /// Cross-checks NTask on every task and returns the global particle count.
    fn check_topology(&self, local_count: usize) -> Result<u64, GravityError> {
        let ntask = self.comm.size();
        let rows = self.comm.all_gather(&[ntask as u64, local_count as u64])?;
        if rows.len() != 2 * ntask {
            return Err(GravityError::InconsistentTopology {
                rank: self.comm.rank(),
                expected: ntask,
                reported: rows.len() / 2,
            });
        }
        let mut total = 0;
        for (task, row) in rows.chunks_exact(2).enumerate() {
            if row[0] as usize != ntask {
                return Err(GravityError::InconsistentTopology { rank: task, expected: ntask, reported: row[0] as usize });
            }
            total += row[1];
        }
        Ok(total)
    }

    /// Runs the hypercube exchange for one pass; returns the number of imported records.
    fn exchange(
        &self,
        counts: &SendCounts,
        offsets: &[usize],
        buffers: &mut ExchangeBuffers<T>,
        particles: &mut [Particle<T>],
        table: &[T; NUM_PARTICLE_TYPES],
        report: &mut PotentialReport,
    ) -> Result<usize, GravityError> {
        let rank = self.comm.rank();
        let capacity = self.params.bunch_size;
        let mut schedule = HypercubeSchedule::new(self.comm.size());
        let mut imported = 0;

        while let Some(batch) = schedule.next_batch(counts, capacity)? {
            report.exchange_batches += 1;
            let placements = batch.placements(counts, rank);

            for p in &placements {
                let out = offsets[p.partner];
                buffers.comm_requests(self.comm, p.partner, out..out + p.send, p.offset..p.offset + p.recv)?;
            }

            let nimport = batch.import_total(counts, rank);
            trace!("task {}: levels {:?} imported {} requests", rank, batch.levels, nimport);
            for slot in 0..nimport {
                let request = buffers.import.read(slot)?;
                let softening = self.params.interaction_softening(table, request.ptype, request.softening)?;
                let potential = self.tree.evaluate_remote(&request, softening);
                buffers.results.write(slot, &GravityResult { potential })?;
            }
            imported += nimport;

            for p in &placements {
                let back = offsets[p.partner];
                buffers.comm_results(self.comm, p.partner, p.offset..p.offset + p.recv, back..back + p.send)?;
                for slot in back..back + p.send {
                    let entry = buffers.index.get(slot).ok_or(GravityError::SlotOutOfRange {
                        slot,
                        capacity: buffers.index.len(),
                    })?;
                    particles[entry.index].potential += buffers.returned.read(slot)?.potential;
                }
            }
        }
        Ok(imported)
    }

    fn request_for(&self, particle: &Particle<T>) -> GravityRequest<T> {
        let softening = if self.params.adaptive_gas_softening {
            own_softening(particle)
        } else {
            T::zero()
        };
        GravityRequest {
            position: particle.position,
            softening,
            old_acc: particle.old_acc,
            ptype: particle.ptype,
        }
    }
}

impl<T: HighPrecision> ExchangeBuffers<T> {
    fn comm_requests<C: Communicator + ?Sized>(
        &mut self,
        comm: &C,
        partner: usize,
        send: std::ops::Range<usize>,
        recv: std::ops::Range<usize>,
    ) -> Result<(), GravityError> {
        let out = self.export.slots(send)?;
        let into = self.import.slots_mut(recv)?;
        comm.sendrecv(partner, MessageTag::PotentialRequest, out, into)
    }

    fn comm_results<C: Communicator + ?Sized>(
        &mut self,
        comm: &C,
        partner: usize,
        send: std::ops::Range<usize>,
        recv: std::ops::Range<usize>,
    ) -> Result<(), GravityError> {
        let out = self.results.slots(send)?;
        let into = self.returned.slots_mut(recv)?;
        comm.sendrecv(partner, MessageTag::PotentialResult, out, into)
    }
}

/// Softening carried by the particle itself: the smoothing length for gas.
fn own_softening<T: HighPrecision>(particle: &Particle<T>) -> T {
    if particle.ptype == 0 {
        particle.hsml
    } else {
        T::zero()
    }
}
