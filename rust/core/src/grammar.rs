// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Block Grammar - ordered dispatch table for text logs
//!
//! The ordered list of `(start, end)` marker pairs *is* the grammar of a text
//! log format. Each line is offered to the rules in order; the first rule
//! whose start marker matches captures its block and runs its handler.
//! Lines no rule claims go to an optional fallback.
//!
//! Self-similar sections (a geometry-optimisation iteration that contains a
//! whole single-point run) are handled by [`GrammarRun::reparse`], which feeds
//! a captured block back through the same grammar after discarding the
//! block's own opening line.

use crate::config::ParseConfig;
use crate::error::{Error, Result};
use crate::line_stream::LineSource;
use crate::text_block::{BlockSpec, TextBlock};

/// Block handler: receives the run (context + recursion), the captured block
/// and the stream the block came from, positioned just after the block.
pub type Handler<C> = Box<dyn Fn(&mut GrammarRun<'_, '_, C>, TextBlock, &mut dyn LineSource) -> Result<()>>;

/// Handler for lines no rule claims
pub type Fallback<C> = Box<dyn Fn(&mut C, &str) -> Result<()>>;

/// One named entry of the grammar
pub struct GrammarRule<C> {
    name: String,
    spec: BlockSpec,
    handler: Handler<C>,
}

impl<C> GrammarRule<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &BlockSpec {
        &self.spec
    }
}

/// Counters for one [`BlockGrammar::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Blocks dispatched to handlers, including re-parsed ones
    pub blocks: usize,
    /// Lines passed to the fallback (or dropped when there is none)
    pub unmatched_lines: usize,
    /// Deepest re-parse level reached
    pub max_depth: usize,
}

/// Ordered table of block rules over a caller-defined context `C`
pub struct BlockGrammar<C> {
    rules: Vec<GrammarRule<C>>,
    fallback: Option<Fallback<C>>,
    config: ParseConfig,
}

impl<C> BlockGrammar<C> {
    pub fn new() -> Self {
        Self::with_config(ParseConfig::default())
    }

    pub fn with_config(config: ParseConfig) -> Self {
        Self {
            rules: Vec::new(),
            fallback: None,
            config,
        }
    }

    /// Append a rule; earlier rules win
    pub fn rule<F>(mut self, name: impl Into<String>, spec: BlockSpec, handler: F) -> Self
    where
        F: Fn(&mut GrammarRun<'_, '_, C>, TextBlock, &mut dyn LineSource) -> Result<()> + 'static,
    {
        self.rules.push(GrammarRule {
            name: name.into(),
            spec,
            handler: Box::new(handler),
        });
        self
    }

    pub fn fallback<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut C, &str) -> Result<()> + 'static,
    {
        self.fallback = Some(Box::new(handler));
        self
    }

    /// The rules in dispatch order
    pub fn rules(&self) -> &[GrammarRule<C>] {
        &self.rules
    }

    /// Drive the whole stream through the grammar
    pub fn run(&self, stream: &mut dyn LineSource, ctx: &mut C) -> Result<RunStats> {
        let mut run = GrammarRun {
            grammar: self,
            ctx,
            depth: 0,
            stats: RunStats::default(),
        };
        run.drive(stream)?;
        tracing::debug!(
            source = stream.source_name(),
            blocks = run.stats.blocks,
            unmatched = run.stats.unmatched_lines,
            "grammar run finished"
        );
        Ok(run.stats)
    }

    /// Offer a single line (already read from `stream`) to the rules.
    /// Returns the name of the rule that claimed it.
    pub fn dispatch(&self, line: &str, stream: &mut dyn LineSource, ctx: &mut C) -> Result<Option<&str>> {
        let mut run = GrammarRun {
            grammar: self,
            ctx,
            depth: 0,
            stats: RunStats::default(),
        };
        run.dispatch_line(line, stream)
    }
}

impl<C> Default for BlockGrammar<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// A grammar being applied to one stream; handed to every handler
pub struct GrammarRun<'g, 'c, C> {
    grammar: &'g BlockGrammar<C>,
    ctx: &'c mut C,
    depth: usize,
    stats: RunStats,
}

impl<'g, 'c, C> GrammarRun<'g, 'c, C> {
    /// Caller's parse state
    pub fn context(&mut self) -> &mut C {
        &mut *self.ctx
    }

    /// Re-parse nesting level (0 at the top)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Feed `block` back through the same grammar, skipping its opening line
    /// so the rule that captured it does not match again.
    pub fn reparse(&mut self, mut block: TextBlock) -> Result<()> {
        let depth = self.depth + 1;
        if depth > self.grammar.config.max_depth {
            return Err(Error::RecursionLimit {
                limit: self.grammar.config.max_depth,
                at: format!("{} line {}", block.source_name(), block.start_line()),
            });
        }

        block.reset();
        if block.next_line()?.is_none() {
            return Ok(());
        }

        let mut nested = GrammarRun {
            grammar: self.grammar,
            ctx: &mut *self.ctx,
            depth,
            stats: RunStats {
                max_depth: depth,
                ..RunStats::default()
            },
        };
        nested.drive(&mut block)?;

        self.stats.blocks += nested.stats.blocks;
        self.stats.unmatched_lines += nested.stats.unmatched_lines;
        self.stats.max_depth = self.stats.max_depth.max(nested.stats.max_depth);
        Ok(())
    }

    fn drive(&mut self, stream: &mut dyn LineSource) -> Result<()> {
        while let Some(line) = stream.next_line()? {
            let before = stream.line_number();
            self.dispatch_line(&line, stream)?;
            debug_assert!(stream.line_number() >= before, "dispatch moved the stream backwards");
        }
        Ok(())
    }

    fn dispatch_line(&mut self, line: &str, stream: &mut dyn LineSource) -> Result<Option<&'g str>> {
        let grammar = self.grammar;
        for rule in &grammar.rules {
            if let Some(block) = TextBlock::from_pattern(line, &mut *stream, &rule.spec)? {
                self.stats.blocks += 1;
                (rule.handler)(self, block, &mut *stream)?;
                return Ok(Some(rule.name.as_str()));
            }
        }

        self.stats.unmatched_lines += 1;
        if let Some(fallback) = &grammar.fallback {
            fallback(&mut *self.ctx, line)?;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_stream::LineStream;
    use crate::value::parse_as;

    #[derive(Default)]
    struct RunLog {
        energies: Vec<f64>,
        cells: Vec<Vec<String>>,
        iterations: usize,
        deepest: usize,
    }

    fn run_grammar() -> BlockGrammar<RunLog> {
        BlockGrammar::new()
            .rule(
                "unit_cell",
                BlockSpec::literal("Unit Cell", "=====").n_end(2),
                |run: &mut GrammarRun<'_, '_, RunLog>, block, _stream| {
                    let body = block.remove_bounds(2, 1);
                    let rows = body.lines().map(|l| l.trim().to_string()).collect();
                    run.context().cells.push(rows);
                    Ok(())
                },
            )
            .rule(
                "iteration",
                BlockSpec::regex(r"^\s*Iteration \d+ start", r"^\s*Iteration \d+ end").unwrap(),
                |run: &mut GrammarRun<'_, '_, RunLog>, block, _stream| {
                    let depth = run.depth() + 1;
                    let ctx = run.context();
                    ctx.iterations += 1;
                    ctx.deepest = ctx.deepest.max(depth);
                    run.reparse(block)
                },
            )
            .fallback(|ctx: &mut RunLog, line| {
                if let Some(rest) = line.trim().strip_prefix("Final energy =") {
                    let value = rest.trim().trim_end_matches("eV").trim();
                    ctx.energies.push(parse_as::<f64>(value)?);
                }
                Ok(())
            })
    }

    const LOG: &str = "\
Run header
Unit Cell
=====
 1.0 0.0
 0.0 1.0
=====
Final energy = -10.5 eV
Iteration 1 start
  Unit Cell
  =====
   2.0 0.0
  =====
  Final energy = -10.7 eV
Iteration 1 end
Final energy = -10.8 eV
";

    #[test]
    fn test_rules_are_inspectable_in_order() {
        let grammar = run_grammar();
        let names: Vec<&str> = grammar.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["unit_cell", "iteration"]);
        assert_eq!(grammar.rules()[0].spec().n_end, 2);
    }

    #[test]
    fn test_run_dispatches_and_reparses() {
        let grammar = run_grammar();
        let mut stream = LineStream::from_text("run.log", LOG);
        let mut log = RunLog::default();

        let stats = grammar.run(&mut stream, &mut log).unwrap();

        assert_eq!(log.energies, vec![-10.5, -10.7, -10.8]);
        assert_eq!(log.cells.len(), 2);
        assert_eq!(log.cells[0], vec!["1.0 0.0", "0.0 1.0"]);
        assert_eq!(log.cells[1], vec!["2.0 0.0"]);
        assert_eq!(log.iterations, 1);
        assert_eq!(log.deepest, 1);
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.max_depth, 1);
    }

    #[test]
    fn test_dispatch_single_line() {
        let grammar = run_grammar();
        let mut stream = LineStream::from_text("run.log", "Unit Cell\n=====\n1 0\n=====\nrest\n");
        let mut log = RunLog::default();

        let line = stream.next_line().unwrap().unwrap();
        let claimed = grammar.dispatch(&line, &mut stream, &mut log).unwrap();
        assert_eq!(claimed, Some("unit_cell"));
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("rest"));

        let claimed = grammar.dispatch("rest", &mut stream, &mut log).unwrap();
        assert_eq!(claimed, None);
    }

    #[test]
    fn test_reparse_depth_is_bounded() {
        let grammar: BlockGrammar<usize> = BlockGrammar::with_config(ParseConfig::default().with_max_depth(1))
            .rule("nest", BlockSpec::literal("<<", ">>").n_end(1), |run, block, _| {
                *run.context() += 1;
                run.reparse(block)
            });

        let mut stream = LineStream::from_text("nest.log", "<<\n<<\nx\n>>\n>>\n");
        let mut entered = 0usize;
        let err = grammar.run(&mut stream, &mut entered).unwrap_err();
        assert!(matches!(err, Error::RecursionLimit { limit: 1, .. }));
        assert_eq!(entered, 2);
    }

    #[test]
    fn test_handler_errors_propagate() {
        let grammar: BlockGrammar<()> = BlockGrammar::new()
            .rule("open", BlockSpec::literal("BEGIN", "END"), |_, _, _| Ok(()));
        let mut stream = LineStream::from_text("cut.log", "BEGIN\nnever closed\n");
        let err = grammar.run(&mut stream, &mut ()).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }));
    }
}
