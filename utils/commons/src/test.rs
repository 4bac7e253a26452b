use concordium_std::concordium_cfg_test;

#[concordium_cfg_test]
pub use inner::*;

#[concordium_cfg_test]
mod inner {
    use concordium_std::test_infrastructure::MockFn;
    use concordium_std::*;
    use std::{cell::RefCell, rc::Rc};

    pub fn parse_and_check_mock<D: Deserial, S>(
        check: impl Fn(&D) -> bool + 'static,
        return_value: impl Clone + Serial + 'static,
    ) -> MockFn<S> {
        MockFn::new(move |parameter, _, _, _state| {
            let value =
                D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            if !check(&value) {
                return Err(CallContractError::Trap);
            };
            Ok((false, Some(return_value.clone())))
        })
    }

    /// Accepts every parsed call and appends its parameter to `calls`.
    pub fn recording_mock<D: Deserial + 'static, S>(calls: Rc<RefCell<Vec<D>>>) -> MockFn<S> {
        MockFn::new(move |parameter, _, _, _state| {
            let value =
                D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            calls.borrow_mut().push(value);
            Ok((false, Some(())))
        })
    }
}
