//! Post-op operator applied in place to the destination image.

use crate::dnn::PostOp;
use crate::errors::DnnResult;
use crate::operators::{ExecContext, Operator, image_slice_mut};

pub struct PostOpOperator {
    post_op: PostOp,
    data_size: usize,
}

impl PostOpOperator {
    pub fn new(post_op: PostOp, data_size: usize) -> Self {
        Self { post_op, data_size }
    }
}

impl Operator for PostOpOperator {
    fn name(&self) -> &'static str {
        "post_op"
    }

    fn apply(&self, ctx: &mut ExecContext<'_>) -> DnnResult<()> {
        let dst = image_slice_mut(self.name(), ctx.dst, ctx.image, self.data_size)?;
        match self.post_op {
            PostOp::Relu => {
                for value in dst.iter_mut() {
                    *value = value.max(0.0);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relu_touches_only_the_current_image() {
        let relu = PostOpOperator::new(PostOp::Relu, 2);
        let mut dst = [-1.0, 1.0, -3.0, 4.0];
        let mut ctx = ExecContext {
            image: 1,
            src: &[],
            weights: &[],
            bias: &[],
            scratch: &mut [],
            dst: &mut dst,
        };
        relu.apply(&mut ctx).unwrap();
        assert_eq!(dst, [-1.0, 1.0, 0.0, 4.0]);
    }
}
