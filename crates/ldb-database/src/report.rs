use std::mem::size_of;

use ldb_store::MemInfo;
use ldb_types::ObjectType;

use crate::database::Database;

/// Entity counts over a whole database.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DbStats {
    pub techs: usize,
    pub libs: usize,
    pub masters: usize,
    pub blocks: usize,
    pub insts: usize,
    pub nets: usize,
    pub props: usize,
}

fn push_lines(lines: &mut Vec<String>, name: &str, info: &MemInfo, depth: usize) {
    let label = format!("{}{}", "   ".repeat(depth), name);
    lines.push(format!(
        "{:<40} cnt={:>10} size={:>12} (avg elem={:>12.1})",
        label,
        info.cnt,
        info.size,
        info.avg_size()
    ));
    for (child, child_info) in &info.children {
        push_lines(lines, child, child_info, depth + 1);
    }
}

impl Database {
    /// Walk every table and accumulate counts and byte sizes.
    pub fn collect_mem_info(&self) -> MemInfo {
        let mut root = MemInfo::new();
        root.add(size_of::<Database>());
        for kind in ObjectType::ALL {
            self.table(kind).collect_mem_info(root.child(kind.name()));
        }
        self.names().collect_mem_info(root.child("name_cache"));
        root
    }

    /// Lines of the memory report: one per level, then the total.
    pub fn report_lines(&self) -> Vec<String> {
        let info = self.collect_mem_info();
        let mut lines = Vec::new();
        push_lines(&mut lines, "Database", &info, 0);
        lines.push(format!("Total size = {} bytes", info.total_size()));
        lines
    }

    /// Emit the memory report through the installed logger.
    pub fn report(&self) {
        let logger = self.logger();
        for line in self.report_lines() {
            logger.report(format_args!("{line}"));
        }
    }

    pub fn stats(&self) -> DbStats {
        let mut stats = DbStats {
            techs: self.techs().len(),
            libs: self.libs().len(),
            masters: self.libs().values().map(|l| l.masters().len()).sum(),
            props: self.properties().len(),
            ..DbStats::default()
        };
        if let Some(chip) = self.chip() {
            stats.blocks = chip.blocks().len();
            for block in chip.blocks().values() {
                stats.insts += block.insts().len();
                stats.nets += block.nets().len();
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{logged_db, rich_sample};

    #[test]
    fn stats_count_every_level() {
        let s = rich_sample();
        assert_eq!(
            s.db.stats(),
            DbStats {
                techs: 2,
                libs: 1,
                masters: 1,
                blocks: 2,
                insts: 2,
                nets: 1,
                props: 4,
            }
        );
        assert_eq!(Database::new().stats(), DbStats::default());
    }

    #[test]
    fn mem_info_has_a_bucket_per_table() {
        let s = rich_sample();
        let info = s.db.collect_mem_info();
        for kind in ObjectType::ALL {
            assert!(info.children.contains_key(kind.name()), "{kind}");
        }
        assert_eq!(info.children["tech"].cnt, 2);
        assert_eq!(info.children["tech"].children["layer"].cnt, 2);
        assert_eq!(info.children["name_cache"].cnt, 4);
        assert!(info.total_size() > 0);
    }

    #[test]
    fn report_goes_through_the_logger() {
        let s = rich_sample();
        s.db.report();
        let lines = s.logger.messages();
        assert_eq!(lines, s.db.report_lines());
        assert!(lines[0].starts_with("Database "));
        assert!(lines.iter().any(|l| l.starts_with("   tech ")));
        assert!(lines.iter().any(|l| l.starts_with("      layer ")));
        let total = lines.last().unwrap();
        assert_eq!(
            total,
            &format!("Total size = {} bytes", s.db.collect_mem_info().total_size())
        );
    }

    #[test]
    fn empty_database_reports_zero_counts() {
        let (db, logger) = logged_db();
        db.report();
        let lines = logger.messages();
        assert!(lines.iter().any(|l| l.contains("   chip") && l.contains("cnt=         0")));
    }
}
