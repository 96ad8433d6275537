//! Driver adapter
//!
//! A fuzz driver only understands flat scalar argument lists. This module
//! bridges typed records to that world: seeds are encoded before they reach
//! the driver, and targets are wrapped in an [`EntryPoint`] whose declared
//! parameters are the record's schema and whose body rebuilds the record
//! before calling the user's function.

use crate::build::build;
use crate::encode::encode;
use crate::linearize::{linearize, Schema};
use crate::record::Record;
use crate::scalar::Scalar;
use crate::Result;
use std::fmt;

/// What the adapter needs from a corpus-based fuzz driver
pub trait FuzzDriver {
    /// Per-invocation handle passed as the target's first argument
    type Context;

    /// Whatever the driver reports after running a target
    type Output;

    /// Store one argument list in the corpus
    fn seed(&mut self, scalars: Vec<Scalar>);

    /// Run `entry` until the driver decides to stop
    fn run(&mut self, entry: EntryPoint<Self::Context>) -> Self::Output;
}

type Body<C> = Box<dyn Fn(&mut C, Vec<Scalar>) -> Result<()> + Send + Sync>;

/// Target callable over flat scalars, with its declared parameter shape
pub struct EntryPoint<C> {
    schema: Schema,
    body: Body<C>,
}

impl<C: 'static> EntryPoint<C> {
    /// Wrap `target` so it can be called with the scalars of a `T`
    pub fn new<T, F>(target: F) -> Result<Self>
    where
        T: Record,
        F: Fn(&mut C, T) + Send + Sync + 'static,
    {
        let schema = linearize::<T>()?;
        let body: Body<C> = Box::new(move |ctx: &mut C, scalars: Vec<Scalar>| {
            let value = build::<T>(scalars)?;
            target(ctx, value);
            Ok(())
        });
        Ok(Self { schema, body })
    }

    /// Record type name the entry point was built for
    pub fn name(&self) -> &'static str {
        self.schema.record_name()
    }

    /// Declared parameters after the context handle
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Rebuild the record from `scalars` and run the target on it.
    ///
    /// Codec failures (wrong shape, wrong kinds) are returned without the
    /// target being called.
    pub fn call(&self, ctx: &mut C, scalars: Vec<Scalar>) -> Result<()> {
        (self.body)(ctx, scalars)
    }
}

impl<C> fmt::Debug for EntryPoint<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Encode `value` and hand it to the driver as a seed
pub fn add_example<D, T>(driver: &mut D, value: &T) -> Result<()>
where
    D: FuzzDriver + ?Sized,
    T: Record,
{
    let scalars = encode(value)?;
    log::trace!("Seeding {} scalars", scalars.len());
    driver.seed(scalars);
    Ok(())
}

/// Register `target` with the driver and run it
pub fn register_target<D, T, F>(driver: &mut D, target: F) -> Result<D::Output>
where
    D: FuzzDriver + ?Sized,
    D::Context: 'static,
    T: Record,
    F: Fn(&mut D::Context, T) + Send + Sync + 'static,
{
    let entry = EntryPoint::new::<T, F>(target)?;
    log::debug!(
        "Registering target over {} ({} parameters)",
        entry.name(),
        entry.schema().len()
    );
    Ok(driver.run(entry))
}
