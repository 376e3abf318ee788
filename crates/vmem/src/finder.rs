use log::debug;

use crate::layout::Geometry;
use crate::phys::PhysicalMemory;

/// Zero every word of `frame`.
pub(crate) fn clear_frame<P: PhysicalMemory>(pm: &mut P, geometry: Geometry, frame: u64) {
    let base = frame * geometry.page_size();
    for i in 0..geometry.page_size() {
        pm.write(base + i, 0);
    }
}

struct EmptySlot {
    frame: u64,
    parent_slot: u64,
}

struct Victim {
    frame: u64,
    page: u64,
    parent_slot: u64,
    distance: u64,
}

/// One depth-first pass over the table tree, carrying the three candidates
/// the finalization step chooses between: an empty table (short-circuits
/// the walk), the highest frame index seen in any entry, and the data page
/// at the greatest cyclic distance from the page being swapped in.
struct Search<'a, P> {
    pm: &'a mut P,
    geometry: Geometry,
    /// Frame the walker is linking from; never a candidate.
    excluded: u64,
    page_in: u64,
    empty: Option<EmptySlot>,
    max_frame: u64,
    victim: Option<Victim>,
}

impl<P: PhysicalMemory> Search<'_, P> {
    fn visit(&mut self, frame: u64, parent_slot: Option<u64>, page_prefix: u64, level: u32) {
        if self.empty.is_some() {
            return;
        }
        if level == self.geometry.tables_depth() {
            let distance = self.geometry.cyclic_distance(self.page_in, page_prefix);
            let better = match &self.victim {
                None => true,
                // Strict: on equal distance the first page in visit order
                // stays the victim.
                Some(v) => distance > v.distance,
            };
            if better {
                self.victim = Some(Victim {
                    frame,
                    page: page_prefix,
                    parent_slot: parent_slot.expect("data pages hang off a table"),
                    distance,
                });
            }
            return;
        }

        let base = frame * self.geometry.page_size();
        let mut has_children = false;
        for i in 0..self.geometry.page_size() {
            let entry = self.pm.read(base + i);
            if entry == 0 {
                continue;
            }
            has_children = true;
            if entry as u64 > self.max_frame {
                self.max_frame = entry as u64;
            }
            let prefix = (page_prefix << self.geometry.offset_width()) | i;
            self.visit(entry as u64, Some(base + i), prefix, level + 1);
            if self.empty.is_some() {
                return;
            }
        }

        if !has_children && frame != self.excluded {
            if let Some(parent_slot) = parent_slot {
                self.empty = Some(EmptySlot { frame, parent_slot });
            }
        }
    }

    fn finalize(self) -> u64 {
        // Case 1: a table with no entries can be unlinked and reused as is.
        if let Some(empty) = self.empty {
            self.pm.write(empty.parent_slot, 0);
            debug!("fault for page {}: reusing empty table frame {}", self.page_in, empty.frame);
            return empty.frame;
        }

        // Case 2: a frame beyond every linked one has never been touched.
        let unused = self.max_frame + 1;
        if unused < self.geometry.num_frames() {
            clear_frame(self.pm, self.geometry, unused);
            debug!("fault for page {}: taking unused frame {}", self.page_in, unused);
            return unused;
        }

        // Case 3: every frame is in use; page out the most cyclically
        // distant data page.
        let victim = self.victim.expect("a fully occupied tree holds data pages");
        debug!(
            "fault for page {}: evicting page {} from frame {} (distance {})",
            self.page_in, victim.page, victim.frame, victim.distance
        );
        self.pm.evict(victim.frame, victim.page);
        clear_frame(self.pm, self.geometry, victim.frame);
        self.pm.write(victim.parent_slot, 0);
        victim.frame
    }
}

/// Supply a frame for the walker to link at a miss, excluding the frame it
/// is linking from. The returned frame is unlinked from any previous parent
/// and, except in the empty-table case, zeroed.
pub(crate) fn find_frame<P: PhysicalMemory>(
    pm: &mut P,
    geometry: Geometry,
    excluded: u64,
    page_in: u64,
) -> u64 {
    let mut search = Search {
        pm,
        geometry,
        excluded,
        page_in,
        empty: None,
        max_frame: 0,
        victim: None,
    };
    search.visit(0, None, 0, 0);
    search.finalize()
}
