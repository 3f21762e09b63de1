//! Elitist generational genetic algorithm over polysomy populations.
//!
//! A [`PolysomyGa`] evolves individuals whose genome is split into several
//! chromosome blocks, each with its own [`Encoding`](crate::core::Encoding)
//! and its own pair of recombination and mutation operators. Every
//! generation the best individual survives unchanged and `N - 1` offspring
//! fill the remaining slots, so the best fitness never regresses.
//!
//! Users construct the engine through [`PolysomyGa::builder`], customize the
//! operators or limits, and then call [`PolysomyGa::run`] with a random
//! number generator.

use crate::core::experiment::{DrawingMode, GenerationStats, RunReport};
use crate::core::{Chromosome, Encoding, LayoutError, Population, PopulationLayout};
use crate::ops::{
    FitnessScaling, LinearScaling, MutationContext, OperatorError, OperatorPair, Problem,
    ProblemError, SelectionOperator, Sense, TournamentSelection,
};
use crate::termination::{Limits, Status, TerminationController};
use rand::{Rng, RngCore};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use tracing::{info, trace, warn};

/// Population size used when the builder is not told otherwise.
pub const DEFAULT_POPULATION_SIZE: usize = 50;

/// Run-level configuration.
///
/// # Examples
/// ```
/// use jeans_psy::{DrawingMode, Limits, RunOptions};
/// use std::time::Duration;
///
/// let options = RunOptions {
///     limits: Limits {
///         max_time: Some(Duration::from_secs(5)),
///         ..Limits::max_generations(200)
///     },
///     log_interval: 10,
///     drawing: DrawingMode::Final,
///     ..RunOptions::default()
/// };
/// assert!(options.verbose);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Budget and stagnation limits.
    pub limits: Limits,
    /// Emit a `debug` event for every logged generation.
    pub verbose: bool,
    /// Record a trace entry every `log_interval` generations; 0 disables it.
    pub log_interval: usize,
    /// Presentation requested from the caller's plotting code.
    pub drawing: DrawingMode,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            verbose: true,
            log_interval: 1,
            drawing: DrawingMode::None,
        }
    }
}

/// Errors detected while assembling a [`PolysomyGa`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Elitism needs at least one offspring slot besides the elite.
    #[error("population size must be at least two (received {0})")]
    InvalidPopulationSize(usize),
    /// No generation, time, evaluation, archive or stagnation limit was set.
    #[error("at least one termination limit must be set")]
    Unbounded,
    /// The trapped tolerance was not positive or not finite.
    #[error("trapped tolerance must be finite and positive (received {0})")]
    InvalidTolerance(f64),
    /// The problem declares no objective.
    #[error("problem must declare at least one objective")]
    NoObjectives,
    /// The problem reports a sense vector of the wrong length.
    #[error("problem declares {expected} objectives but {found} senses")]
    SenseCountMismatch {
        /// Declared objectives.
        expected: usize,
        /// Reported senses.
        found: usize,
    },
    /// The layout decodes to a different dimensionality than the problem.
    #[error("layout decodes {layout} decision variables but the problem expects {problem}")]
    DimensionMismatch {
        /// Dimensions covered by the layout.
        layout: usize,
        /// Dimensions declared by the problem.
        problem: usize,
    },
    /// An operator override addressed a block that does not exist.
    #[error("operator override for block {index} but the layout has {blocks} blocks")]
    InvalidBlockIndex {
        /// Requested block.
        index: usize,
        /// Number of blocks.
        blocks: usize,
    },
    /// Wrapper around [`ProblemError`].
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// Wrapper around [`LayoutError`].
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// Wrapper around [`OperatorError`].
    #[error(transparent)]
    Operator(#[from] OperatorError),
}

/// Step of a generation in which a run failed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Sampling, evaluating or seeding the initial population.
    Init,
    /// Scaling fitness and drawing parents.
    Select,
    /// Recombining a block.
    Recombine,
    /// Mutating a block.
    Mutate,
    /// Evaluating offspring and forming the next population.
    Evaluate,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::Select => "select",
            Self::Recombine => "recombine",
            Self::Mutate => "mutate",
            Self::Evaluate => "evaluate",
        })
    }
}

/// Underlying cause of a failed run.
#[derive(Debug, thiserror::Error)]
pub enum RunFailure {
    /// The problem rejected the batch or returned malformed values.
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// Genome rows or evaluation arrays did not fit the layout.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// An operator failed.
    #[error(transparent)]
    Operator(#[from] OperatorError),
    /// Fitness was requested for a population without objective values.
    #[error("population has not been evaluated")]
    NotEvaluated,
    /// An operator changed the number or width of rows of a block.
    #[error("operator changed the shape of block {block}")]
    ShapeChanged {
        /// Offending block.
        block: usize,
    },
}

/// Errors produced by [`PolysomyGa::run`].
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    /// The engine configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A generation failed.
    #[error("generation {generation} failed during {phase}: {source}")]
    Run {
        /// Generation in which the failure happened.
        generation: usize,
        /// Step of the generation.
        phase: Phase,
        /// Cause of the failure.
        #[source]
        source: RunFailure,
    },
}

impl EvolutionError {
    fn run(generation: usize, phase: Phase, source: impl Into<RunFailure>) -> Self {
        Self::Run {
            generation,
            phase,
            source: source.into(),
        }
    }
}

/// Final population plus the run record.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Population after the last generation, evaluated and scaled.
    pub population: Population,
    /// Best solution, counters, trace and archive.
    pub report: RunReport,
}

type GenerationHook = Box<dyn FnMut(&GenerationStats)>;

/// Builder returned by [`PolysomyGa::builder`].
pub struct PolysomyGaBuilder<P> {
    problem: P,
    layout: PopulationLayout,
    population_size: usize,
    options: RunOptions,
    selection: Option<Box<dyn SelectionOperator>>,
    scaling: Option<Box<dyn FitnessScaling>>,
    overrides: Vec<(usize, OperatorPair)>,
    hook: Option<GenerationHook>,
}

impl<P> PolysomyGaBuilder<P>
where
    P: Problem,
{
    /// Configures the number of individuals per generation.
    #[must_use]
    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Replaces every run option.
    #[must_use]
    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Limits the run to `generations` generations.
    #[must_use]
    pub fn max_generations(mut self, generations: usize) -> Self {
        self.options.limits.max_generations = Some(generations);
        self
    }

    /// Replaces the budget and stagnation limits.
    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.options.limits = limits;
        self
    }

    /// Replaces the selection operator.
    #[must_use]
    pub fn selection(mut self, operator: impl SelectionOperator + 'static) -> Self {
        self.selection = Some(Box::new(operator));
        self
    }

    /// Replaces the fitness scaling operator.
    #[must_use]
    pub fn scaling(mut self, operator: impl FitnessScaling + 'static) -> Self {
        self.scaling = Some(Box::new(operator));
        self
    }

    /// Replaces the operators of block `index`.
    #[must_use]
    pub fn block_operators(mut self, index: usize, operators: OperatorPair) -> Self {
        self.overrides.push((index, operators));
        self
    }

    /// Registers a hook invoked with statistics once per generation.
    #[must_use]
    pub fn on_generation(mut self, hook: impl FnMut(&GenerationStats) + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Finalizes the builder into a [`PolysomyGa`] engine.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the population size is below two, no
    /// limit is set, the problem and layout disagree, an override targets a
    /// missing block, or default operator construction fails.
    pub fn build(self) -> Result<PolysomyGa<P>, ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::InvalidPopulationSize(self.population_size));
        }
        let problem = self.problem;
        problem.validate_bounds()?;
        let objectives = problem.objectives();
        if objectives == 0 {
            return Err(ConfigError::NoObjectives);
        }
        let senses = problem.senses();
        if senses.len() != objectives {
            return Err(ConfigError::SenseCountMismatch {
                expected: objectives,
                found: senses.len(),
            });
        }
        if self.layout.dimensions() != problem.dimensions() {
            return Err(ConfigError::DimensionMismatch {
                layout: self.layout.dimensions(),
                problem: problem.dimensions(),
            });
        }
        let limits = &self.options.limits;
        if !limits.is_bounded() {
            return Err(ConfigError::Unbounded);
        }
        if !(limits.trapped_tolerance.is_finite() && limits.trapped_tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance(limits.trapped_tolerance));
        }
        let mut operators: Vec<Option<OperatorPair>> =
            self.layout.blocks().iter().map(|_| None).collect();
        for (index, pair) in self.overrides {
            let blocks = operators.len();
            let slot = operators
                .get_mut(index)
                .ok_or(ConfigError::InvalidBlockIndex { index, blocks })?;
            *slot = Some(pair);
        }
        let operators = operators
            .into_iter()
            .zip(self.layout.blocks())
            .map(|(pair, field)| match pair {
                Some(pair) => Ok(pair),
                None => OperatorPair::for_field(field, problem.dimensions()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let selection: Box<dyn SelectionOperator> = match self.selection {
            Some(operator) => operator,
            None => Box::new(TournamentSelection::default()),
        };
        let scaling: Box<dyn FitnessScaling> = match self.scaling {
            Some(operator) => operator,
            None => Box::new(LinearScaling),
        };
        Ok(PolysomyGa {
            problem,
            layout: Arc::new(self.layout),
            population_size: self.population_size,
            options: self.options,
            selection,
            scaling,
            operators,
            senses,
            hook: self.hook,
        })
    }
}

/// Elitist single-objective genetic algorithm over a multi-block genome.
pub struct PolysomyGa<P> {
    problem: P,
    layout: Arc<PopulationLayout>,
    population_size: usize,
    options: RunOptions,
    selection: Box<dyn SelectionOperator>,
    scaling: Box<dyn FitnessScaling>,
    operators: Vec<OperatorPair>,
    senses: Vec<Sense>,
    hook: Option<GenerationHook>,
}

impl<P> PolysomyGa<P>
where
    P: Problem,
{
    /// Creates a builder used to configure the engine.
    ///
    /// # Examples
    /// ```
    /// use jeans_psy::ops::{Evaluation, Problem, ProblemBounds, ProblemResult};
    /// use jeans_psy::{Encoding, PolysomyGa, PopulationLayout, StopReason, VariableBounds};
    /// use rand::SeedableRng;
    ///
    /// struct Sphere {
    ///     variables: Vec<VariableBounds>,
    /// }
    ///
    /// impl ProblemBounds for Sphere {
    ///     fn dimensions(&self) -> usize { self.variables.len() }
    ///     fn variables(&self) -> &[VariableBounds] { &self.variables }
    /// }
    ///
    /// impl Problem for Sphere {
    ///     fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
    ///         Ok(Evaluation::single(
    ///             decisions.iter().map(|row| row.iter().map(|x| x * x).sum()).collect(),
    ///         ))
    ///     }
    /// }
    ///
    /// let problem = Sphere { variables: vec![VariableBounds::real(-1.0, 1.0); 3] };
    /// let layout = PopulationLayout::split(problem.variables(), &[(Encoding::RealInteger, 3)]).unwrap();
    /// let mut ga = PolysomyGa::builder(problem, layout)
    ///     .population_size(10)
    ///     .max_generations(5)
    ///     .build()
    ///     .unwrap();
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    /// let outcome = ga.run(None, &mut rng).unwrap();
    /// assert_eq!(outcome.population.len(), 10);
    /// assert_eq!(outcome.report.reason, StopReason::MaxGenerations);
    /// ```
    #[must_use]
    pub fn builder(problem: P, layout: PopulationLayout) -> PolysomyGaBuilder<P> {
        PolysomyGaBuilder {
            problem,
            layout,
            population_size: DEFAULT_POPULATION_SIZE,
            options: RunOptions::default(),
            selection: None,
            scaling: None,
            overrides: Vec::new(),
            hook: None,
        }
    }

    /// Creates a builder whose layout splits the problem's variables into
    /// consecutive `(encoding, width)` blocks.
    ///
    /// # Errors
    /// Returns [`ConfigError::Layout`] when the blocks do not cover the
    /// problem's variables or a block cannot be described.
    pub fn builder_from_blocks(
        problem: P,
        blocks: &[(Encoding, usize)],
    ) -> Result<PolysomyGaBuilder<P>, ConfigError> {
        let layout = PopulationLayout::split(problem.variables(), blocks)?;
        Ok(Self::builder(problem, layout))
    }

    /// Number of individuals per generation.
    #[must_use]
    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// Block layout of every individual.
    #[must_use]
    pub fn layout(&self) -> &Arc<PopulationLayout> {
        &self.layout
    }

    /// Run configuration.
    #[must_use]
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Problem being optimized.
    #[must_use]
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Runs the algorithm until a limit is hit.
    ///
    /// A `prophet` population is placed before the randomly sampled one and
    /// the result truncated to the population size, so prophet individuals
    /// take precedence. Its objective and violation arrays are trusted as
    /// they are; a prophet without them fails the run with
    /// [`RunFailure::NotEvaluated`].
    ///
    /// # Errors
    /// Returns [`EvolutionError::Run`] with the failing generation and phase
    /// when the problem, an operator or the population algebra fails.
    pub fn run<R: Rng>(
        &mut self,
        prophet: Option<Population>,
        rng: &mut R,
    ) -> Result<RunOutcome, EvolutionError> {
        let size = self.population_size;
        info!(
            population_size = size,
            blocks = self.layout.len(),
            encodings = ?self.layout.encodings(),
            dimensions = self.layout.dimensions(),
            "starting polysomy elitist GA"
        );
        let mut controller = TerminationController::new(
            self.options.limits.clone(),
            self.senses.clone(),
            self.options.log_interval,
            self.options.verbose,
        );
        let sampled = Population::random(Arc::clone(&self.layout), size, rng);
        let sampled = self.evaluate(sampled, 0, Phase::Init)?;
        controller.record_evaluations(size);
        let mut population = match prophet {
            Some(prophet) => {
                if prophet.len() > size {
                    warn!(
                        prophet = prophet.len(),
                        population_size = size,
                        "prophet population truncated"
                    );
                }
                prophet
                    .concat(&sampled)
                    .map_err(|err| EvolutionError::run(0, Phase::Init, err))?
                    .truncated(size)
            }
            None => sampled,
        };
        self.rescale(&mut population, 0, Phase::Init)?;

        let reason = loop {
            let hook = &mut self.hook;
            let status = controller.check(&population, &mut |stats: &GenerationStats| {
                if let Some(hook) = hook.as_mut() {
                    hook(stats);
                }
            });
            if let Status::Stopped(reason) = status {
                break reason;
            }
            population = self.step(population, &mut controller, rng)?;
        };
        let report = controller.finish(reason, self.options.drawing);
        Ok(RunOutcome { population, report })
    }

    fn step(
        &mut self,
        mut population: Population,
        controller: &mut TerminationController,
        rng: &mut dyn RngCore,
    ) -> Result<Population, EvolutionError> {
        let generation = controller.generation();
        self.rescale(&mut population, generation, Phase::Select)?;
        let elite_idx = population
            .best_index()
            .ok_or_else(|| EvolutionError::run(generation, Phase::Select, RunFailure::NotEvaluated))?;
        let elite = population.select(&[elite_idx]);
        let fitness = population
            .fitness()
            .ok_or_else(|| EvolutionError::run(generation, Phase::Select, RunFailure::NotEvaluated))?;
        let parents = self
            .selection
            .select(fitness, self.population_size - 1, rng)
            .map_err(|err| EvolutionError::run(generation, Phase::Select, err))?;
        let offspring = population.select(&parents);

        let context = MutationContext {
            generation,
            progress: controller.progress(),
        };
        let mut blocks: Vec<Vec<Chromosome>> = Vec::with_capacity(self.layout.len());
        for (block, ((rows, field), pair)) in offspring
            .into_blocks()
            .into_iter()
            .zip(self.layout.blocks())
            .zip(&self.operators)
            .enumerate()
        {
            trace!(
                generation,
                block,
                encoding = %field.encoding(),
                rows = rows.len(),
                "applying block operators"
            );
            let recombined = pair.recombination.recombine(&rows, rng);
            if !same_shape(&recombined, rows.len(), field.gene_count()) {
                return Err(shape_error(generation, Phase::Recombine, block));
            }
            let mutated = pair.mutation.mutate_block(&recombined, field, &context, rng);
            if !same_shape(&mutated, rows.len(), field.gene_count()) {
                return Err(shape_error(generation, Phase::Mutate, block));
            }
            blocks.push(mutated);
        }
        let offspring = Population::from_blocks(Arc::clone(&self.layout), blocks)
            .map_err(|err| EvolutionError::run(generation, Phase::Mutate, err))?;

        let offspring = self.evaluate(offspring, generation, Phase::Evaluate)?;
        controller.record_evaluations(offspring.len());
        let mut next = elite
            .concat(&offspring)
            .map_err(|err| EvolutionError::run(generation, Phase::Evaluate, err))?;
        self.rescale(&mut next, generation, Phase::Evaluate)?;
        Ok(next)
    }

    fn evaluate(
        &mut self,
        mut population: Population,
        generation: usize,
        phase: Phase,
    ) -> Result<Population, EvolutionError> {
        let evaluation = self
            .problem
            .evaluate_checked(population.phenotype())
            .map_err(|err| EvolutionError::run(generation, phase, err))?;
        let violations = evaluation
            .violations
            .unwrap_or_else(|| vec![0.0; population.len()]);
        population
            .set_evaluation(evaluation.objectives, violations)
            .map_err(|err| EvolutionError::run(generation, phase, err))?;
        Ok(population)
    }

    fn rescale(
        &self,
        population: &mut Population,
        generation: usize,
        phase: Phase,
    ) -> Result<(), EvolutionError> {
        let objectives = population
            .objectives()
            .ok_or_else(|| EvolutionError::run(generation, phase, RunFailure::NotEvaluated))?;
        let fitness = self
            .scaling
            .scale(objectives, population.violations(), &self.senses);
        population
            .set_fitness(fitness)
            .map_err(|err| EvolutionError::run(generation, phase, err))
    }
}

fn same_shape(rows: &[Chromosome], expected_rows: usize, gene_count: usize) -> bool {
    rows.len() == expected_rows && rows.iter().all(|row| row.len() == gene_count)
}

fn shape_error(generation: usize, phase: Phase, block: usize) -> EvolutionError {
    EvolutionError::run(generation, phase, RunFailure::ShapeChanged { block })
}
