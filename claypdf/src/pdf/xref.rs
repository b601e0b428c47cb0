use fnv::FnvHashMap;

use crate::{
    error::{Error, Result},
    writer::{number, Writer},
};

/// Highest object number a PDF file may contain.
pub const MAX_OBJECT_NUMBER: u32 = (1 << 23) - 1;

const XREF: &[u8] = b"xref\n";
/// Head of the free list, object 0 is always free.
const FREE_HEAD: &[u8] = b"0 1\n0000000000 65535 f \n";
const USED_SUFFIX: &[u8] = b" 00000 n \n";
const OFFSET_DIGITS: usize = 10;

/// An object that was written to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsedObject {
    /// Number of this object
    pub number: u32,
    /// The position of this object in bytes, relative to the start of the
    /// document.
    pub byte_offset: usize,
}

/// Allocates object numbers and remembers where each object starts.
///
/// Numbers are handed out in increasing order and never reused. Each number
/// gets exactly one offset.
#[derive(Debug, Default)]
pub struct CrossReferenceTable {
    last: u32,
    offsets: FnvHashMap<u32, usize>,
}

impl CrossReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always returns a number that was not returned before and has no offset.
    pub fn next_unused(&mut self) -> Result<u32> {
        loop {
            if self.last >= MAX_OBJECT_NUMBER {
                return Err(Error::ObjectNumberOverflow);
            }
            self.last += 1;
            if self.is_available(self.last) {
                return Ok(self.last);
            }
        }
    }

    pub fn is_available(&self, number: u32) -> bool {
        !self.offsets.contains_key(&number)
    }

    pub fn set_offset(&mut self, number: u32, byte_offset: usize) -> Result<()> {
        if number == 0 || number > MAX_OBJECT_NUMBER {
            return Err(Error::ObjectNumberOverflow);
        }
        if !self.is_available(number) {
            return Err(Error::DuplicateObject(number));
        }
        self.offsets.insert(number, byte_offset);
        Ok(())
    }

    pub fn offset(&self, number: u32) -> Option<usize> {
        self.offsets.get(&number).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Highest object number with an offset.
    pub fn max_number(&self) -> u32 {
        self.offsets.keys().copied().max().unwrap_or(0)
    }

    /// All recorded objects, sorted by number.
    pub fn used_objects(&self) -> Vec<UsedObject> {
        let mut used: Vec<UsedObject> = self
            .offsets
            .iter()
            .map(|(&number, &byte_offset)| UsedObject { number, byte_offset })
            .collect();
        used.sort_unstable_by_key(|u| u.number);
        used
    }

    /// Write the `xref` section. Consecutive numbers share one subsection.
    pub fn write(&self, out: &mut dyn Writer) -> std::io::Result<()> {
        log::trace!("write XRef with {} entries", self.len());

        out.write(XREF)?;
        out.write(FREE_HEAD)?;

        let used = self.used_objects();
        for run in subsections(&used) {
            out.write(format!("{} {}\n", run[0].number, run.len()).as_bytes())?;
            for entry in run {
                out.write(number::format_size(entry.byte_offset, OFFSET_DIGITS).as_bytes())?;
                out.write(USED_SUFFIX)?;
            }
        }
        Ok(())
    }

    /// Drop all entries. The number counter keeps going so numbers are still
    /// never reused.
    pub fn reset(&mut self) {
        self.offsets = FnvHashMap::default();
    }
}

/// Split sorted entries into runs of consecutive object numbers.
fn subsections(sorted: &[UsedObject]) -> impl Iterator<Item = &[UsedObject]> {
    let mut rest = sorted;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let len = rest
            .windows(2)
            .position(|pair| pair[1].number != pair[0].number + 1)
            .map_or(rest.len(), |gap| gap + 1);
        let (run, tail) = rest.split_at(len);
        rest = tail;
        Some(run)
    })
}
