use std::{collections::BTreeMap, fmt, io::Write};

use quick_xml::{
    events::{BytesEnd, BytesStart, Event},
    Writer,
};
use regex::Regex;

use crate::{stats::Finding, Error, Result};

/// Number of counter slots: slot 0 is the total, slots 1 to 4 the priorities
pub const PRIORITY_BUCKETS: usize = 5;

type BugCounts = [u32; PRIORITY_BUCKETS];

fn xml_error(error: impl fmt::Display) -> Error {
    Error::Error(format!("xml: {error}"))
}

fn push_priorities(element: &mut BytesStart<'_>, counts: &BugCounts) {
    for priority in (1..PRIORITY_BUCKETS).rev() {
        if counts[priority] > 0 {
            element.push_attribute((
                format!("priority_{priority}").as_str(),
                counts[priority].to_string().as_str(),
            ));
        }
    }
}

/// Bug counts and size of one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassStats {
    name: String,
    source_file: Option<String>,
    is_interface: bool,
    bugs: BugCounts,
    size: u32,
}

impl ClassStats {
    /// Creates empty statistics for `name`
    #[must_use]
    pub fn new(name: &str, source_file: Option<&str>) -> Self {
        ClassStats {
            name: name.to_string(),
            source_file: source_file.map(str::to_string),
            is_interface: false,
            bugs: [0; PRIORITY_BUCKETS],
            size: 0,
        }
    }

    /// Dotted class name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source file name
    #[must_use]
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// Returns `true` for interfaces
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    /// Marks the class as interface or not
    pub fn set_interface(&mut self, is_interface: bool) {
        self.is_interface = is_interface;
    }

    /// Size in non-commenting source statements
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Sets the size
    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    /// Counts `finding`; priorities outside 1 to 4 are ignored
    pub fn add_error(&mut self, finding: &Finding) {
        if let Some(bucket) = finding.bucket() {
            self.bugs[bucket] += 1;
            self.bugs[0] += 1;
        }
    }

    /// Total number of findings
    #[must_use]
    pub fn total_bugs(&self) -> u32 {
        self.bugs[0]
    }

    /// Findings of `priority`; 0 gives the total, out-of-range priorities give 0
    #[must_use]
    pub fn bugs_at_priority(&self, priority: usize) -> u32 {
        self.bugs.get(priority).copied().unwrap_or(0)
    }

    /// Resets all bug counters
    pub fn clear_bug_counts(&mut self) {
        self.bugs = [0; PRIORITY_BUCKETS];
    }

    /// Writes a `ClassStats` element; nothing if the size is zero.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the underlying writer fails.
    pub fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        if self.size == 0 {
            return Ok(());
        }

        let mut element = BytesStart::new("ClassStats");
        element.push_attribute(("class", self.name.as_str()));
        if let Some(source_file) = &self.source_file {
            element.push_attribute(("sourceFile", source_file.as_str()));
        }
        element.push_attribute(("interface", if self.is_interface { "true" } else { "false" }));
        element.push_attribute(("size", self.size.to_string().as_str()));
        element.push_attribute(("bugs", self.bugs[0].to_string().as_str()));
        push_priorities(&mut element, &self.bugs);

        writer.write_event(Event::Empty(element))?;
        Ok(())
    }
}

/// Bug counts and size of one package, with its classes.
///
/// # Examples
///
/// ```rust
/// use jvmscope::stats::{Finding, PackageStats, SourceLocation};
///
/// let mut stats = PackageStats::new("com.example");
/// stats.add_class("com.example.Widget", Some("Widget.java"), false, 25, true);
/// stats.add_error(&Finding::new(2, SourceLocation::new("com.example.Widget", Some("Widget.java"))));
///
/// assert_eq!(stats.total_bugs(), 1);
/// assert_eq!(stats.to_string(), "com.example, 1 classes, 25 ncss");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageStats {
    package_name: String,
    bugs: BugCounts,
    size: u32,
    num_classes: usize,
    members: BTreeMap<String, ClassStats>,
}

impl PackageStats {
    /// Creates empty statistics for `package_name`
    #[must_use]
    pub fn new(package_name: &str) -> Self {
        Self::with_counts(package_name, 0, 0)
    }

    /// Creates statistics with a known class count and size but no class entries
    #[must_use]
    pub fn with_counts(package_name: &str, num_classes: usize, size: u32) -> Self {
        PackageStats {
            package_name: package_name.to_string(),
            bugs: [0; PRIORITY_BUCKETS],
            size,
            num_classes,
            members: BTreeMap::new(),
        }
    }

    /// Dotted package name
    #[must_use]
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Number of classes
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Overrides the number of classes
    pub fn set_num_classes(&mut self, num_classes: usize) {
        self.num_classes = num_classes;
    }

    /// Size in non-commenting source statements
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Sets the size without touching the class entries
    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    /// Total number of findings
    #[must_use]
    pub fn total_bugs(&self) -> u32 {
        self.bugs[0]
    }

    /// Findings of `priority`; 0 gives the total, out-of-range priorities give 0
    #[must_use]
    pub fn bugs_at_priority(&self, priority: usize) -> u32 {
        self.bugs.get(priority).copied().unwrap_or(0)
    }

    fn class_entry(&mut self, name: &str, source_file: Option<&str>) -> &mut ClassStats {
        if !self.members.contains_key(name) {
            self.num_classes = self.members.len() + 1;
        }
        self.members
            .entry(name.to_string())
            .or_insert_with(|| ClassStats::new(name, source_file))
    }

    /// Counts `finding` for the package and for the class of its primary location.
    ///
    /// The class entry is created if it does not exist yet. Priorities outside 1 to 4 are
    /// ignored.
    pub fn add_error(&mut self, finding: &Finding) {
        let Some(bucket) = finding.bucket() else {
            return;
        };
        self.bugs[bucket] += 1;
        self.bugs[0] += 1;

        let location = &finding.location;
        self.class_entry(&location.class_name, location.source_file.as_deref())
            .add_error(finding);
    }

    /// Adds or updates the entry for class `name`.
    ///
    /// With `update_package_stats` the class size is added to the package size.
    pub fn add_class(
        &mut self,
        name: &str,
        source_file: Option<&str>,
        is_interface: bool,
        size: u32,
        update_package_stats: bool,
    ) {
        let mut class = self
            .members
            .get(name)
            .cloned()
            .unwrap_or_else(|| ClassStats::new(name, source_file));
        class.set_interface(is_interface);
        class.set_size(size);
        self.add_class_stats(class, update_package_stats);
    }

    /// Adds `class`, replacing an entry of the same name.
    ///
    /// The first class added to a package without entries resets the package size and class
    /// count, which until then may hold values from [`PackageStats::with_counts`].
    pub fn add_class_stats(&mut self, class: ClassStats, update_package_stats: bool) {
        if self.members.is_empty() {
            self.size = 0;
            self.num_classes = 0;
        }
        let size = class.size();
        if self.members.insert(class.name().to_string(), class).is_none() {
            self.num_classes = self.members.len();
        }
        if update_package_stats {
            self.size += size;
        }
    }

    /// The entry for class `name`
    #[must_use]
    pub fn class_stats(&self, name: &str) -> Option<&ClassStats> {
        self.members.get(name)
    }

    /// All class entries, sorted by class name
    pub fn sorted_class_stats(&self) -> impl Iterator<Item = &ClassStats> {
        self.members.values()
    }

    /// Recomputes counters, size and class count from the class entries
    pub fn recompute_from_class_stats(&mut self) {
        self.bugs = [0; PRIORITY_BUCKETS];
        self.size = 0;
        self.num_classes = self.members.len();
        for class in self.members.values() {
            for (slot, count) in self.bugs.iter_mut().enumerate() {
                *count += class.bugs_at_priority(slot);
            }
            self.size += class.size();
        }
    }

    /// Resets the bug counters of the package and all classes
    pub fn clear_bug_counts(&mut self) {
        self.bugs = [0; PRIORITY_BUCKETS];
        for class in self.members.values_mut() {
            class.clear_bug_counts();
        }
    }

    /// Drops every class entry whose name does not contain a match of `pattern`.
    ///
    /// Package totals are left alone; call [`PackageStats::recompute_from_class_stats`]
    /// afterwards to bring them in line.
    pub fn purge_classes_that_dont_match(&mut self, pattern: &Regex) {
        self.members.retain(|name, _| pattern.is_match(name));
    }

    /// Writes a `PackageStats` element with its class entries; nothing if the size is zero.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the underlying writer fails.
    pub fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        if self.size == 0 {
            return Ok(());
        }

        let total_types = if self.members.is_empty() {
            self.num_classes
        } else {
            self.members.len()
        };

        let mut element = BytesStart::new("PackageStats");
        element.push_attribute(("package", self.package_name.as_str()));
        element.push_attribute(("total_bugs", self.bugs[0].to_string().as_str()));
        element.push_attribute(("total_types", total_types.to_string().as_str()));
        element.push_attribute(("total_size", self.size.to_string().as_str()));
        push_priorities(&mut element, &self.bugs);

        writer.write_event(Event::Start(element))?;
        for class in self.sorted_class_stats() {
            class.write_xml(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("PackageStats")))?;
        Ok(())
    }

    /// Serializes to an XML string; empty if the size is zero.
    ///
    /// # Errors
    /// Returns [`Error::Error`] if serialization fails.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_xml(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(xml_error)
    }
}

impl fmt::Display for PackageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} classes, {} ncss",
            self.package_name, self.num_classes, self.size
        )
    }
}
