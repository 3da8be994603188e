use super::*;

// int fib(int n) {
//   if (n <= 1) return n;
//   int a = 0, b = 1;
//   for (int i = 2; i <= n; i++) { int tmp = a + b; a = b; b = tmp; }
//   return b;
// }
fn fibonacci_graph() -> Graph {
    let mut g = Graph::new();
    let root = g.add_node(0, Opcode::Root);
    let start = g.add_node(1, Opcode::Start);
    let p_n = parm(&mut g, 2, 0);

    let con1 = con_i(&mut g, 3, 1);
    let cmp_base = binop(&mut g, 4, Opcode::CmpI, p_n, con1);
    let le_base = bool_node(&mut g, 5, cmp_base, 3);
    let (base_taken, base_skipped) = branch(&mut g, 6, start, le_base);

    // Base case: return n.
    let ret_base = g.add_node(9, Opcode::Return);
    g.set_input(ret_base, 0, base_taken);
    g.set_input(ret_base, 1, p_n);

    let con0 = con_i(&mut g, 10, 0);
    let con2 = con_i(&mut g, 11, 2);

    let loop_header = g.add_node(12, Opcode::Region);
    g.set_input(loop_header, 0, base_skipped);

    let phi_a = g.add_node(13, Opcode::Phi);
    g.set_input(phi_a, 0, loop_header);
    g.set_input(phi_a, 1, con0);
    let phi_b = g.add_node(14, Opcode::Phi);
    g.set_input(phi_b, 0, loop_header);
    g.set_input(phi_b, 1, con1);
    let phi_i = g.add_node(15, Opcode::Phi);
    g.set_input(phi_i, 0, loop_header);
    g.set_input(phi_i, 1, con2);

    let tmp = binop(&mut g, 16, Opcode::AddI, phi_a, phi_b);
    let next_i = binop(&mut g, 17, Opcode::AddI, phi_i, con1);

    let cmp_loop = binop(&mut g, 18, Opcode::CmpI, phi_i, p_n);
    let le_loop = bool_node(&mut g, 19, cmp_loop, 3);
    let (loop_again, loop_done) = branch(&mut g, 20, loop_header, le_loop);

    // Back edge with simultaneous phi advancement.
    g.add_input(loop_header, loop_again);
    g.add_input(phi_a, phi_b);
    g.add_input(phi_b, tmp);
    g.add_input(phi_i, next_i);

    let ret_loop = g.add_node(23, Opcode::Return);
    g.set_input(ret_loop, 0, loop_done);
    g.set_input(ret_loop, 1, phi_b);

    let region_ret = g.add_node(24, Opcode::Region);
    g.set_input(region_ret, 0, ret_base);
    g.set_input(region_ret, 1, ret_loop);
    g.set_input(root, 0, region_ret);
    g
}

#[test]
fn fibonacci() {
    let g = fibonacci_graph();
    for (n, expected) in [(0, 0), (1, 1), (2, 1), (5, 5), (10, 55)] {
        let outcome = exec(&g, &[Value::I32(n)]);
        assert_eq!(ret_i32(&outcome), expected, "fib({n})");
    }
}

// int factorial(int n) {
//   int result = 1;
//   for (int i = 2; i <= n; i++) result *= i;
//   return result;
// }
fn factorial_graph() -> Graph {
    let mut g = Graph::new();
    let root = g.add_node(0, Opcode::Root);
    let start = g.add_node(1, Opcode::Start);
    let p_n = parm(&mut g, 2, 0);

    let con1 = con_i(&mut g, 3, 1);
    let con2 = con_i(&mut g, 4, 2);

    let loop_header = g.add_node(5, Opcode::Region);
    g.set_input(loop_header, 0, start);

    let phi_result = g.add_node(6, Opcode::Phi);
    g.set_input(phi_result, 0, loop_header);
    g.set_input(phi_result, 1, con1);
    let phi_i = g.add_node(7, Opcode::Phi);
    g.set_input(phi_i, 0, loop_header);
    g.set_input(phi_i, 1, con2);

    let cmp_loop = binop(&mut g, 8, Opcode::CmpI, phi_i, p_n);
    let le_loop = bool_node(&mut g, 9, cmp_loop, 3);
    let (loop_again, loop_done) = branch(&mut g, 10, loop_header, le_loop);

    let next_result = binop(&mut g, 13, Opcode::MulI, phi_result, phi_i);
    let next_i = binop(&mut g, 14, Opcode::AddI, phi_i, con1);

    g.add_input(loop_header, loop_again);
    g.add_input(phi_result, next_result);
    g.add_input(phi_i, next_i);

    let ret = g.add_node(15, Opcode::Return);
    g.set_input(ret, 0, loop_done);
    g.set_input(ret, 1, phi_result);
    g.set_input(root, 0, ret);
    g
}

#[test]
fn factorial() {
    let g = factorial_graph();
    for (n, expected) in [(0, 1), (1, 1), (5, 120), (10, 3_628_800)] {
        assert_eq!(ret_i32(&exec(&g, &[Value::I32(n)])), expected, "{n}!");
    }
}

#[test]
fn factorial_outcome_is_reproducible() {
    let g = factorial_graph();
    let interp = Interpreter::new(&g);
    let first = interp.execute(&[Value::I32(7)]).unwrap();
    let second = interp.execute(&[Value::I32(7)]).unwrap();
    assert_eq!(first, second);
    assert_eq!(ret_i32(&first), 5040);
}

// int gcd(int a, int b) {
//   while (b != 0) { int tmp = b; b = a % b; a = tmp; }
//   return a;
// }
fn gcd_graph() -> Graph {
    let mut g = Graph::new();
    let root = g.add_node(0, Opcode::Root);
    let start = g.add_node(1, Opcode::Start);
    let p_a = parm(&mut g, 2, 0);
    let p_b = parm(&mut g, 3, 1);
    let con0 = con_i(&mut g, 4, 0);

    let loop_header = g.add_node(5, Opcode::Region);
    g.set_input(loop_header, 0, start);

    let phi_a = g.add_node(6, Opcode::Phi);
    g.set_input(phi_a, 0, loop_header);
    g.set_input(phi_a, 1, p_a);
    let phi_b = g.add_node(7, Opcode::Phi);
    g.set_input(phi_b, 0, loop_header);
    g.set_input(phi_b, 1, p_b);

    let cmp_loop = binop(&mut g, 8, Opcode::CmpI, phi_b, con0);
    let ne_loop = bool_node(&mut g, 9, cmp_loop, 5);
    let (loop_again, loop_done) = branch(&mut g, 10, loop_header, ne_loop);

    let rem = binop(&mut g, 13, Opcode::ModI, phi_a, phi_b);

    g.add_input(loop_header, loop_again);
    g.add_input(phi_a, phi_b); // a = old b
    g.add_input(phi_b, rem); // b = a % b

    let ret = g.add_node(14, Opcode::Return);
    g.set_input(ret, 0, loop_done);
    g.set_input(ret, 1, phi_a);
    g.set_input(root, 0, ret);
    g
}

#[test]
fn gcd() {
    let g = gcd_graph();
    let cases = [((48, 18), 6), ((100, 35), 5), ((17, 19), 1), ((17, 13), 1), ((0, 9), 9)];
    for ((a, b), expected) in cases {
        let outcome = exec(&g, &[Value::I32(a), Value::I32(b)]);
        assert_eq!(ret_i32(&outcome), expected, "gcd({a}, {b})");
    }
}

// int power(int base, int exp) {
//   int result = 1;
//   for (int i = 0; i < exp; i++) result *= base;
//   return result;
// }
fn power_graph() -> Graph {
    let mut g = Graph::new();
    let root = g.add_node(0, Opcode::Root);
    let start = g.add_node(1, Opcode::Start);
    let p_base = parm(&mut g, 2, 0);
    let p_exp = parm(&mut g, 3, 1);
    let con0 = con_i(&mut g, 4, 0);
    let con1 = con_i(&mut g, 5, 1);

    let loop_header = g.add_node(6, Opcode::Region);
    g.set_input(loop_header, 0, start);

    let phi_result = g.add_node(7, Opcode::Phi);
    g.set_input(phi_result, 0, loop_header);
    g.set_input(phi_result, 1, con1);
    let phi_i = g.add_node(8, Opcode::Phi);
    g.set_input(phi_i, 0, loop_header);
    g.set_input(phi_i, 1, con0);

    let cmp_loop = binop(&mut g, 9, Opcode::CmpI, phi_i, p_exp);
    let lt_loop = bool_node(&mut g, 10, cmp_loop, 1);
    let (loop_again, loop_done) = branch(&mut g, 11, loop_header, lt_loop);

    let next_result = binop(&mut g, 14, Opcode::MulI, phi_result, p_base);
    let next_i = binop(&mut g, 15, Opcode::AddI, phi_i, con1);

    g.add_input(loop_header, loop_again);
    g.add_input(phi_result, next_result);
    g.add_input(phi_i, next_i);

    let ret = g.add_node(16, Opcode::Return);
    g.set_input(ret, 0, loop_done);
    g.set_input(ret, 1, phi_result);
    g.set_input(root, 0, ret);
    g
}

#[test]
fn power() {
    let g = power_graph();
    let cases = [((2, 0), 1), ((2, 10), 1024), ((3, 4), 81), ((5, 3), 125)];
    for ((base, exp), expected) in cases {
        let outcome = exec(&g, &[Value::I32(base), Value::I32(exp)]);
        assert_eq!(ret_i32(&outcome), expected, "{base}^{exp}");
    }
}

// int sign(int n) { return n > 0 ? 1 : (n < 0 ? -1 : 0); }
fn sign_graph() -> Graph {
    let mut g = Graph::new();
    let root = g.add_node(0, Opcode::Root);
    let start = g.add_node(1, Opcode::Start);
    let p_n = parm(&mut g, 2, 0);
    let con0 = con_i(&mut g, 3, 0);

    let cmp = binop(&mut g, 4, Opcode::CmpI, p_n, con0);
    let gt = bool_node(&mut g, 5, cmp, 4);
    let (pos, non_pos) = branch(&mut g, 6, start, gt);

    let lt = bool_node(&mut g, 9, cmp, 1);
    let (neg, zero) = branch(&mut g, 10, non_pos, lt);

    let con1 = con_i(&mut g, 13, 1);
    let con_m1 = con_i(&mut g, 14, -1);

    let inner = g.add_node(15, Opcode::Region);
    g.set_input(inner, 0, neg);
    g.set_input(inner, 1, zero);
    let phi_inner = g.add_node(16, Opcode::Phi);
    g.set_input(phi_inner, 0, inner);
    g.set_input(phi_inner, 1, con_m1);
    g.set_input(phi_inner, 2, con0);

    let outer = g.add_node(17, Opcode::Region);
    g.set_input(outer, 0, pos);
    g.set_input(outer, 1, inner);
    let phi_outer = g.add_node(18, Opcode::Phi);
    g.set_input(phi_outer, 0, outer);
    g.set_input(phi_outer, 1, con1);
    g.set_input(phi_outer, 2, phi_inner);

    let ret = g.add_node(19, Opcode::Return);
    g.set_input(ret, 0, outer);
    g.set_input(ret, 1, phi_outer);
    g.set_input(root, 0, ret);
    g
}

#[test]
fn sign() {
    let g = sign_graph();
    for (n, expected) in [(17, 1), (-4, -1), (0, 0), (i32::MIN, -1), (i32::MAX, 1)] {
        assert_eq!(ret_i32(&exec(&g, &[Value::I32(n)])), expected, "sign({n})");
    }
}

// boolean isPrime(int n) {
//   if (n <= 1) return 0;
//   for (int i = 2; i * i <= n; i++)
//     if (n % i == 0) return 0;
//   return 1;
// }
fn is_prime_graph() -> Graph {
    let mut g = Graph::new();
    let root = g.add_node(0, Opcode::Root);
    let start = g.add_node(1, Opcode::Start);
    let p_n = parm(&mut g, 2, 0);
    let con1 = con_i(&mut g, 3, 1);
    let con2 = con_i(&mut g, 4, 2);
    let con0 = con_i(&mut g, 5, 0);

    // n <= 1 -> return 0
    let cmp_small = binop(&mut g, 6, Opcode::CmpI, p_n, con1);
    let le_small = bool_node(&mut g, 7, cmp_small, 3);
    let (small, not_small) = branch(&mut g, 8, start, le_small);
    let ret_small = g.add_node(11, Opcode::Return);
    g.set_input(ret_small, 0, small);
    g.set_input(ret_small, 1, con0);

    let loop_header = g.add_node(12, Opcode::Region);
    g.set_input(loop_header, 0, not_small);
    let phi_i = g.add_node(13, Opcode::Phi);
    g.set_input(phi_i, 0, loop_header);
    g.set_input(phi_i, 1, con2);

    // i * i <= n
    let sq = binop(&mut g, 14, Opcode::MulI, phi_i, phi_i);
    let cmp_loop = binop(&mut g, 15, Opcode::CmpI, sq, p_n);
    let le_loop = bool_node(&mut g, 16, cmp_loop, 3);
    let (in_loop, loop_done) = branch(&mut g, 17, loop_header, le_loop);

    // n % i == 0 -> return 0
    let rem = binop(&mut g, 20, Opcode::ModI, p_n, phi_i);
    let cmp_div = binop(&mut g, 21, Opcode::CmpI, rem, con0);
    let eq_div = bool_node(&mut g, 22, cmp_div, 2);
    let (divides, coprime) = branch(&mut g, 23, in_loop, eq_div);
    let ret_composite = g.add_node(26, Opcode::Return);
    g.set_input(ret_composite, 0, divides);
    g.set_input(ret_composite, 1, con0);

    let next_i = binop(&mut g, 27, Opcode::AddI, phi_i, con1);
    g.add_input(loop_header, coprime);
    g.add_input(phi_i, next_i);

    let ret_prime = g.add_node(28, Opcode::Return);
    g.set_input(ret_prime, 0, loop_done);
    g.set_input(ret_prime, 1, con1);

    let region_ret = g.add_node(29, Opcode::Region);
    g.set_input(region_ret, 0, ret_small);
    g.set_input(region_ret, 1, ret_composite);
    g.set_input(region_ret, 2, ret_prime);
    g.set_input(root, 0, region_ret);
    g
}

#[test]
fn is_prime() {
    let g = is_prime_graph();
    let cases = [
        (0, 0),
        (1, 0),
        (2, 1),
        (3, 1),
        (4, 0),
        (16, 0),
        (17, 1),
        (25, 0),
        (97, 1),
    ];
    for (n, expected) in cases {
        assert_eq!(ret_i32(&exec(&g, &[Value::I32(n)])), expected, "isPrime({n})");
    }
}

// A phi advanced over i64 values exercises the widening path in a loop.
#[test]
fn long_accumulator_loop() {
    // long sum = 0; for (int i = 1; i <= n; i++) sum += i; return sum;
    let mut g = Graph::new();
    let root = g.add_node(0, Opcode::Root);
    let start = g.add_node(1, Opcode::Start);
    let p_n = parm(&mut g, 2, 0);
    let con0l = g.add_node(3, Opcode::ConL);
    g.set_prop(con0l, "value", 0i64);
    let con1 = con_i(&mut g, 4, 1);

    let loop_header = g.add_node(5, Opcode::Region);
    g.set_input(loop_header, 0, start);
    let phi_sum = g.add_node(6, Opcode::Phi);
    g.set_input(phi_sum, 0, loop_header);
    g.set_input(phi_sum, 1, con0l);
    let phi_i = g.add_node(7, Opcode::Phi);
    g.set_input(phi_i, 0, loop_header);
    g.set_input(phi_i, 1, con1);

    let cmp = binop(&mut g, 8, Opcode::CmpI, phi_i, p_n);
    let le = bool_node(&mut g, 9, cmp, 3);
    let (again, done) = branch(&mut g, 10, loop_header, le);

    let widened = g.add_node(13, Opcode::ConvI2L);
    g.set_input(widened, 1, phi_i);
    let next_sum = binop(&mut g, 14, Opcode::AddL, phi_sum, widened);
    let next_i = binop(&mut g, 15, Opcode::AddI, phi_i, con1);

    g.add_input(loop_header, again);
    g.add_input(phi_sum, next_sum);
    g.add_input(phi_i, next_i);

    let ret = g.add_node(16, Opcode::Return);
    g.set_input(ret, 0, done);
    g.set_input(ret, 1, phi_sum);
    g.set_input(root, 0, ret);

    let outcome = exec(&g, &[Value::I32(50)]);
    assert_eq!(outcome.return_value(), Some(Value::I64(1275)));
}
