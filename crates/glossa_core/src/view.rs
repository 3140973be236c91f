//! Base component trait

use std::fmt;
use std::marker::PhantomData;

/// A presentation component: turns props into output
pub trait Component {
    type Props;
    type Output;

    /// Render the component (called again whenever its inputs change)
    fn render(&self, props: &Self::Props) -> Self::Output;
}

/// A component backed by a plain function
pub struct FnComponent<F, P> {
    render: F,
    _props: PhantomData<fn(&P)>,
}

/// Create a component from a render function
pub fn component_fn<P, O, F>(render: F) -> FnComponent<F, P>
where
    F: Fn(&P) -> O,
{
    FnComponent {
        render,
        _props: PhantomData,
    }
}

impl<P, O, F> Component for FnComponent<F, P>
where
    F: Fn(&P) -> O,
{
    type Props = P;
    type Output = O;

    fn render(&self, props: &P) -> O {
        (self.render)(props)
    }
}

impl<F, P> fmt::Debug for FnComponent<F, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnComponent").finish_non_exhaustive()
    }
}
