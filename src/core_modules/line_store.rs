// THEORY:
// The `LineDelayStore` is one scan line's worth of pixel memory with one
// write port and one synchronous read port. Written at the current input
// x-coordinate and read just ahead of it, it hands back every sample
// exactly one frame-width of accepted transfers after it went in — a
// one-scanline delay, which is how the pipeline sees the row above the
// pixel it is working on.
//
// Key architectural principles:
// 1.  **Masked addressing only**: every address is reduced modulo the
//     capacity before it touches the cells. An out-of-range index after
//     masking means the store itself is inconsistent; that is a fatal
//     fault, never a recoverable error.
// 2.  **Synchronous, non-transparent read**: the read port latches
//     `cells[addr]` into a register that becomes visible at the next
//     commit. A read and a write to the same cell in one cycle return the
//     pre-write value.
// 3.  **Two-phase discipline**: `sample` and `write` only stage work;
//     nothing is observable until `commit`.

use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::sync::Reg;
use crate::error::PipelineError;

pub struct LineDelayStore {
    cells: Vec<Pixel>,
    read_data: Reg<Pixel>,
    staged_write: Option<(usize, Pixel)>,
}

impl LineDelayStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: vec![Pixel::BLACK; capacity],
            read_data: Reg::default(),
            staged_write: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// The read register as of the last commit.
    pub fn read_data(&self) -> Pixel {
        self.read_data.get()
    }

    /// Stages a read of `address` (masked) into the read register.
    pub fn sample(&mut self, address: usize) -> Result<(), PipelineError> {
        let addr = self.masked(address)?;
        self.read_data.drive(self.cells[addr]);
        Ok(())
    }

    /// Stages a write of `pixel` at `address` (masked) for the next commit.
    pub fn write(&mut self, address: usize, pixel: Pixel) -> Result<(), PipelineError> {
        let addr = self.masked(address)?;
        self.staged_write = Some((addr, pixel));
        Ok(())
    }

    /// Applies the staged write and latches the staged read. The read was
    /// sampled from the pre-write contents, so same-cycle read/write of one
    /// cell observes the old value.
    pub fn commit(&mut self) {
        self.read_data.commit();
        if let Some((addr, pixel)) = self.staged_write.take() {
            self.cells[addr] = pixel;
        }
    }

    /// Synchronous reset: zeroes the read register and every cell.
    pub fn clear(&mut self) {
        self.read_data.load(Pixel::BLACK);
        self.staged_write = None;
        self.cells.fill(Pixel::BLACK);
    }

    /// Read-only view of the stored line, for tracing tools.
    pub fn contents(&self) -> &[Pixel] {
        &self.cells
    }

    fn masked(&self, address: usize) -> Result<usize, PipelineError> {
        let capacity = self.cells.len();
        let addr = address % capacity;
        if addr >= capacity {
            return Err(PipelineError::AddressFault {
                address: addr,
                capacity,
            });
        }
        Ok(addr)
    }
}
