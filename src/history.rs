use rustyline::history::DefaultHistory;

/// Read access to the lines entered so far, oldest first.
pub trait HistoryLog {
    /// Number shown next to the oldest entry.
    fn base(&self) -> usize {
        1
    }

    /// Entries in chronological order.
    fn entries(&self) -> Box<dyn Iterator<Item = &str> + '_>;
}

impl HistoryLog for DefaultHistory {
    fn entries(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.iter().map(String::as_str))
    }
}

impl HistoryLog for [String] {
    fn entries(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.iter().map(String::as_str))
    }
}

impl HistoryLog for Vec<String> {
    fn entries(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        self.as_slice().entries()
    }
}

/// Count of lines accepted into a bounded history over the whole session.
///
/// A size-capped log drops its oldest entries; the count keeps the numbers
/// of the surviving entries stable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AddedLines(usize);

impl AddedLines {
    /// Note the outcome of one attempt to add a line.
    pub fn record(&mut self, accepted: bool) {
        if accepted {
            self.0 += 1;
        }
    }

    pub fn count(&self) -> usize {
        self.0
    }

    /// View `log` numbered from the first line ever added to it.
    pub fn numbered<H: HistoryLog + ?Sized>(self, log: &H) -> Numbered<'_, H> {
        Numbered {
            log,
            added: self.0,
        }
    }
}

/// A history log whose base advances past evicted entries.
pub struct Numbered<'a, H: ?Sized> {
    log: &'a H,
    added: usize,
}

impl<H: HistoryLog + ?Sized> HistoryLog for Numbered<'_, H> {
    fn base(&self) -> usize {
        let evicted = self.added.saturating_sub(self.log.entries().count());
        self.log.base() + evicted
    }

    fn entries(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        self.log.entries()
    }
}
