use crate::synthesis::Timeline;

/// What one column shows in an instant row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// No activity in this column
    Empty,
    /// Activity starts at this instant (▲)
    Start,
    /// Activity ends at this instant (▼)
    End,
    /// Activity passes through (│)
    Through,
}

/// One line of the timeline diagram
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Visual gap before a distant instant; `true` columns keep their line
    Spacer { next: f64, lines: Vec<bool> },

    /// An instant at which some activity starts or ends
    Instant {
        t: f64,
        cells: Vec<Cell>,
        /// Activities (timeline indices) starting now, in column order
        starting: Vec<usize>,
    },
}

/// Lay the timeline out in columns
///
/// The distinct start and end offsets are visited in ascending order. At
/// each instant `t`: emit a spacer if the gap from the previous instant
/// exceeds `spacer_threshold_ns`, free columns whose activity ended before
/// `t`, shrink the used width past empty trailing columns, put activities
/// starting at `t` in the lowest free columns, then emit the instant row.
pub fn layout(timeline: &Timeline, spacer_threshold_ns: f64) -> Vec<Row> {
    let activities = timeline.activities();

    // A zero-length activity ends before it starts; it only gets a start row
    let mut instants: Vec<f64> = activities
        .iter()
        .flat_map(|a| [Some(a.start()), (a.end() >= a.start()).then_some(a.end())])
        .flatten()
        .collect();
    instants.sort_by(f64::total_cmp);
    instants.dedup();

    // Which activity occupies each column
    let mut columns: Vec<Option<usize>> = vec![None; activities.len()];
    let mut used = 0;
    let mut last: Option<f64> = None;
    let mut rows = Vec::new();

    for t in instants {
        if let Some(last_t) = last {
            if t - last_t > spacer_threshold_ns {
                let lines = columns[..used]
                    .iter()
                    .map(|slot| slot.is_some_and(|i| activities[i].end() != last_t))
                    .collect();
                rows.push(Row::Spacer { next: t, lines });
            }
        }

        for slot in columns.iter_mut() {
            if slot.is_some_and(|i| activities[i].end() < t) {
                *slot = None;
            }
        }

        while used > 0 && columns[used - 1].is_none() {
            used -= 1;
        }

        for (i, activity) in activities.iter().enumerate() {
            if activity.start() != t {
                continue;
            }
            let column = match columns.iter().position(Option::is_none) {
                Some(free) => {
                    columns[free] = Some(i);
                    free
                }
                None => {
                    columns.push(Some(i));
                    columns.len() - 1
                }
            };
            used = used.max(column + 1);
        }

        let cells = columns[..used]
            .iter()
            .map(|slot| match *slot {
                None => Cell::Empty,
                Some(i) if activities[i].start() == t => Cell::Start,
                Some(i) if activities[i].end() == t => Cell::End,
                Some(_) => Cell::Through,
            })
            .collect();

        let starting = columns[..used]
            .iter()
            .filter_map(|slot| slot.filter(|&i| activities[i].start() == t))
            .collect();

        rows.push(Row::Instant { t, cells, starting });
        last = Some(t);
    }

    rows
}
